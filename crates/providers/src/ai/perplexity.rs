//! Perplexity chat completion with a tiny token budget

use provider::ValidationStatus::{Invalid, RateLimited, Unavailable};
use provider::{
    BoxFuture, Credentials, Probe, ProbeContext, ProbeError, ProbeRequest, RequiredFields,
    StatusRule, StatusTable, ValidationResult, metadata, required, rule,
};
use serde_json::json;

pub const ENDPOINT: &str = "https://api.perplexity.ai/chat/completions";
pub const MODEL: &str = "sonar";

/// Message for any failure that produced no HTTP response.
pub const TRANSPORT_FAILURE: &str = "Request timeout or connection error";

const RULES: &[StatusRule] = &[
    rule(400, Invalid, "Invalid request format or missing parameters"),
    rule(401, Invalid, "Invalid API key provided"),
    rule(403, Invalid, "Access forbidden - check your API key permissions"),
    rule(404, Invalid, "Requested resource not found"),
    rule(429, RateLimited, "Rate limit exceeded - please try again later"),
    rule(500, Unavailable, "Perplexity service temporarily unavailable"),
    rule(503, Unavailable, "Perplexity service is currently overloaded - please try again later"),
];

static TABLE: StatusTable = StatusTable::new(RULES, "Perplexity API request failed");

#[derive(Debug, Default, Clone, Copy)]
pub struct PerplexityProbe;

impl Probe for PerplexityProbe {
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
                .bearer(api_key)?
                .header("accept", "application/json")?
                .json(json!({
                    "model": MODEL,
                    "messages": [{
                        "role": "user",
                        "content": "Respond with only the word \"Working\" if you can see this message.",
                    }],
                    "max_tokens": 10,
                    "temperature": 0.1,
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

            let Some(preview) = response.str_at("/choices/0/message/content") else {
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
                "model" => MODEL,
                "response_preview" => preview,
                "usage" => response.pointer("/usage"),
            }))
        })
    }
}
