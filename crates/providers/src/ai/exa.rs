//! Exa answer endpoint

use provider::ValidationStatus::{Invalid, RateLimited, Unavailable};
use provider::{
    BoxFuture, Credentials, Probe, ProbeContext, ProbeError, ProbeRequest, RequiredFields,
    StatusRule, StatusTable, ValidationResult, metadata, required, rule,
};
use serde_json::{Value, json};

pub const ENDPOINT: &str = "https://api.exa.ai/answer";

/// Message for any failure that produced no HTTP response.
pub const TRANSPORT_FAILURE: &str = "Request timeout or connection error";

const RULES: &[StatusRule] = &[
    rule(400, Invalid, "Invalid request format or missing parameters"),
    rule(401, Invalid, "Invalid API key provided"),
    rule(403, Invalid, "Access forbidden - check your API key permissions"),
    rule(404, Invalid, "Requested resource not found"),
    rule(429, RateLimited, "Rate limit exceeded - please try again later"),
    rule(500, Unavailable, "Exa service temporarily unavailable"),
    rule(503, Unavailable, "Exa service is currently overloaded - please try again later"),
];

static TABLE: StatusTable = StatusTable::new(RULES, "Exa API request failed");

#[derive(Debug, Default, Clone, Copy)]
pub struct ExaProbe;

impl Probe for ExaProbe {
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
            let request = ProbeRequest::post(ENDPOINT)
                .secret_header("x-api-key", api_key)?
                .header("accept", "application/json")?
                .json(json!({
                    "query": "What is Exa? Answer in 5 words starting with 'Exa is'.",
                    "stream": false,
                    "text": false,
                }));

            let response = match ctx.send(request).await {
                Ok(response) => response,
                Err(error) => {
                    return Ok(ValidationResult::failure(ctx.name(), TRANSPORT_FAILURE)
                        .with_status(Unavailable)
                        .with_metadata(metadata! {
                            "error_details" => error.message,
                            "exception" => error.kind.as_str(),
                        }));
                }
            };

            if !response.is_ok() {
                return Ok(TABLE
                    .failure(ctx.name(), response.status_code, None)
                    .with_metadata(metadata! { "response_body" => response.body }));
            }

            let Some(answer) = response.str_at("/answer") else {
                return Ok(ValidationResult::failure(
                    ctx.name(),
                    format!("Unexpected response from {} API", ctx.name()),
                )
                .with_metadata(metadata! { "response_body" => response.body }));
            };

            let total_cost = response
                .pointer("/costDollars/total")
                .cloned()
                .unwrap_or_else(|| Value::from(0));

            Ok(ValidationResult::success(
                ctx.name(),
                format!("{} API key is valid and working.", ctx.name()),
            )
            .with_code("200")
            .with_metadata(metadata! {
                "answer" => answer,
                "total_cost" => total_cost,
            }))
        })
    }
}
