//! Request errors raised before a provider is reached

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;

/// Field name to the messages raised for it.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Error, Debug)]
pub enum RequestError {
    /// The body could not be read as JSON.
    #[error("{message}")]
    Malformed { status: StatusCode, message: String },

    /// The body parsed but failed the request preconditions.
    #[error("{message}")]
    Unprocessable { message: String, errors: FieldErrors },
}

impl RequestError {
    /// Summary message: the first error, with a count of the rest.
    pub fn unprocessable(errors: FieldErrors) -> Self {
        let mut messages = errors.values().flatten();
        let first = messages.next().cloned().unwrap_or_default();
        let rest = messages.count();
        let message = match rest {
            0 => first,
            1 => format!("{first} (and 1 more error)"),
            n => format!("{first} (and {n} more errors)"),
        };
        RequestError::Unprocessable { message, errors }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            RequestError::Malformed { status, .. } => *status,
            RequestError::Unprocessable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl From<JsonRejection> for RequestError {
    fn from(rejection: JsonRejection) -> Self {
        RequestError::Malformed {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            RequestError::Malformed { message, .. } => json!({ "message": message }),
            RequestError::Unprocessable { message, errors } => {
                json!({ "message": message, "errors": errors })
            }
        };
        (status, Json(body)).into_response()
    }
}
