//! Polar organizations listing

use provider::ValidationStatus::{Failed, Forbidden, Invalid, RateLimited, Unavailable};
use provider::{
    BoxFuture, Credentials, Probe, ProbeContext, ProbeError, ProbeRequest, ProbeResponse,
    RequiredFields, StatusRule, StatusTable, ValidationResult, metadata, required, rule,
};
use serde_json::Value;

pub const ENDPOINT: &str = "https://api.polar.sh/v1/organizations/";

const RULES: &[StatusRule] = &[
    rule(400, Invalid, "Bad Request - Invalid or missing parameters"),
    rule(401, Invalid, "Invalid credentials - Invalid API key"),
    rule(403, Forbidden, "Forbidden - You do not have permission to access this resource"),
    rule(404, Invalid, "Not Found - The requested resource was not found"),
    rule(422, Invalid, "Validation Error - {detail}"),
    rule(429, RateLimited, "Rate limited - You are being rate limited"),
    rule(500, Unavailable, "Server Error - An error occurred on the server"),
];

static TABLE: StatusTable = StatusTable::new(RULES, "An unexpected error occurred: {detail}");

/// First validation message of a FastAPI-style `detail` array.
fn error_detail(response: &ProbeResponse) -> Option<&str> {
    response
        .str_at("/detail/0/msg")
        .or_else(|| response.str_at("/detail"))
}

/// Names of the listed organizations; `None` when the page has no `items` array.
fn organization_names(response: &ProbeResponse) -> Option<Vec<&str>> {
    let items = response.pointer("/items").and_then(Value::as_array)?;
    Some(
        items
            .iter()
            .filter_map(|organization| organization.get("name").and_then(Value::as_str))
            .collect(),
    )
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PolarProbe;

impl Probe for PolarProbe {
    fn required_fields(&self) -> RequiredFields {
        RequiredFields::new([("api_key", "API Key")])
    }

    fn probe<'a>(
        &'a self,
        ctx: ProbeContext<'a>,
        credentials: &'a Credentials,
    ) -> BoxFuture<'a, Result<ValidationResult, ProbeError>> {
        Box::pin(async move {
            let api_key = required(credentials, "api_key")?;
            let request = ProbeRequest::get(ENDPOINT)
                .bearer(api_key)?
                .header("accept", "application/json")?;

            let response = match ctx.send(request).await {
                Ok(response) => response,
                Err(error) => {
                    return Ok(ValidationResult::failure(
                        ctx.name(),
                        format!("Connection error: {}", error.message),
                    )
                    .with_status(Failed)
                    .with_metadata(error.metadata()));
                }
            };

            if !response.is_ok() {
                return Ok(TABLE.failure(ctx.name(), response.status_code, error_detail(&response)));
            }

            let Some(names) = organization_names(&response) else {
                return Ok(ValidationResult::failure(
                    ctx.name(),
                    format!("Unexpected response from {} API", ctx.name()),
                )
                .with_metadata(metadata! { "response_body" => response.body }));
            };

            Ok(ValidationResult::success(
                ctx.name(),
                format!("{} API key is valid and working.", ctx.name()),
            )
            .with_code("200")
            .with_metadata(metadata! {
                "organizations" => response.data,
                "organization_names" => names,
            }))
        })
    }
}
