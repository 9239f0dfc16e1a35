//! HTTP routes
//!
//! `POST /validate` checks the request shape, resolves the provider by slug
//! and returns its result. Everything a provider reports, including transport
//! trouble on its side, is a 200 with the result body; only request-shape
//! problems and unknown slugs change the HTTP status.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use provider::{Credentials, NOT_FOUND_PROVIDER, ValidationResult, ValidationStatus};
use providers::Registry;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, info_span, warn};

use crate::error::{FieldErrors, RequestError};

const PROVIDER_MAX_CHARS: usize = 255;

const PROVIDER_REQUIRED: &str = "Provider is required.";
const PROVIDER_NOT_STRING: &str = "Provider must be a string.";
const PROVIDER_TOO_LONG: &str = "Provider may not be greater than 255 characters.";
const CREDENTIALS_REQUIRED: &str = "Credentials are required.";
const CREDENTIALS_NOT_OBJECT: &str = "Credentials must be an object.";
const CREDENTIAL_FIELD_REQUIRED: &str = "All credential fields are required.";
const CREDENTIAL_FIELD_NOT_STRING: &str = "All credential fields must be strings.";

/// Shared application state accessible from all handlers
#[derive(Clone)]
pub struct AppState {
    registry: Arc<Registry>,
    prometheus: PrometheusHandle,
    started_at: Instant,
}

impl AppState {
    pub fn new(registry: Registry, prometheus: PrometheusHandle) -> Self {
        Self {
            registry: Arc::new(registry),
            prometheus,
            started_at: Instant::now(),
        }
    }
}

/// Build the router with all routes and shared state, limited to
/// `max_connections` requests in flight.
pub fn router(state: AppState, max_connections: usize) -> Router {
    Router::new()
        .route("/validate", post(validate_handler))
        .route("/providers", get(providers_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_connections))
        .with_state(state)
}

/// A `POST /validate` body that passed the request preconditions.
#[derive(Debug)]
pub struct ValidateRequest {
    pub provider: String,
    pub credentials: Credentials,
}

impl ValidateRequest {
    /// Check the body shape. Every problem is collected, keyed by field;
    /// string values are trimmed and a blank string counts as missing.
    pub fn from_json(body: &Value) -> Result<Self, RequestError> {
        let mut errors = FieldErrors::new();

        let provider = match body.get("provider") {
            None | Some(Value::Null) => reject(&mut errors, "provider", PROVIDER_REQUIRED),
            Some(Value::String(slug)) => {
                let slug = slug.trim();
                if slug.is_empty() {
                    reject(&mut errors, "provider", PROVIDER_REQUIRED)
                } else if slug.chars().count() > PROVIDER_MAX_CHARS {
                    reject(&mut errors, "provider", PROVIDER_TOO_LONG)
                } else {
                    Some(slug.to_string())
                }
            }
            Some(_) => reject(&mut errors, "provider", PROVIDER_NOT_STRING),
        };

        let credentials = match body.get("credentials") {
            None | Some(Value::Null) => reject(&mut errors, "credentials", CREDENTIALS_REQUIRED),
            Some(Value::Object(fields)) if fields.is_empty() => {
                reject(&mut errors, "credentials", CREDENTIALS_REQUIRED)
            }
            Some(Value::Object(fields)) => {
                let mut credentials = Credentials::new();
                for (field, value) in fields {
                    let key = format!("credentials.{field}");
                    match value {
                        Value::String(value) if !value.trim().is_empty() => {
                            credentials.insert(field.as_str(), value.trim());
                        }
                        Value::String(_) | Value::Null => {
                            reject::<()>(&mut errors, key, CREDENTIAL_FIELD_REQUIRED);
                        }
                        _ => {
                            reject::<()>(&mut errors, key, CREDENTIAL_FIELD_NOT_STRING);
                        }
                    }
                }
                Some(credentials)
            }
            Some(_) => reject(&mut errors, "credentials", CREDENTIALS_NOT_OBJECT),
        };

        match (provider, credentials) {
            (Some(provider), Some(credentials)) if errors.is_empty() => Ok(Self {
                provider,
                credentials,
            }),
            _ => Err(RequestError::unprocessable(errors)),
        }
    }
}

fn reject<T>(errors: &mut FieldErrors, field: impl Into<String>, message: &str) -> Option<T> {
    errors
        .entry(field.into())
        .or_default()
        .push(message.to_string());
    None
}

/// The boundary's answer for a slug the catalog does not know.
pub fn not_found() -> ValidationResult {
    ValidationResult::failure(NOT_FOUND_PROVIDER, "Service not found")
        .with_status(ValidationStatus::Unavailable)
}

async fn validate_handler(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, RequestError> {
    let Json(body) = body?;
    let request = ValidateRequest::from_json(&body)?;

    let request_id = format!("req_{}", uuid::Uuid::new_v4().as_simple());
    let span = info_span!(
        "validate",
        request_id = %request_id,
        provider = %request.provider,
        fields = request.credentials.len(),
    );

    let (status, result) = async {
        match state
            .registry
            .validate(&request.provider, &request.credentials)
            .await
        {
            Ok(result) => (StatusCode::OK, result),
            Err(unknown) => {
                warn!(error = %unknown, "validation requested for unknown provider");
                (StatusCode::NOT_FOUND, not_found())
            }
        }
    }
    .instrument(span)
    .await;

    Ok((status, [("x-request-id", request_id)], Json(result)).into_response())
}

/// Catalog grouped by category, for index pages.
async fn providers_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "categories": state.registry.catalog().grouped() }))
}

async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "providers": state.registry.len(),
        "uptime_seconds": state.started_at.elapsed().as_secs(),
    }))
}

/// Prometheus metrics endpoint in text exposition format.
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        state.prometheus.render(),
    )
}
