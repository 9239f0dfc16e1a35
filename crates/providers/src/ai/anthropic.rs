//! Anthropic Messages API

use provider::ValidationStatus::{Invalid, RateLimited, Unavailable};
use provider::{
    BoxFuture, Credentials, Metadata, Probe, ProbeContext, ProbeError, ProbeRequest,
    ProbeResponse, RequiredFields, StatusRule, StatusTable, ValidationResult, required, rule,
};
use serde_json::{Value, json};

use crate::ack::{self, Completion, Subject};
use crate::chat::error_detail;

pub const ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
pub const MODEL: &str = "claude-3-haiku-20240307";
pub const API_VERSION: &str = "2023-06-01";

const RULES: &[StatusRule] = &[
    rule(
        400,
        Invalid,
        "Invalid request - There was an issue with the format or content of your request",
    ),
    rule(401, Invalid, "Authentication error - There's an issue with your API key"),
    rule(
        403,
        Invalid,
        "Permission error - Your API key does not have permission to use the specified resource",
    ),
    rule(404, Invalid, "Not found - The requested resource was not found"),
    rule(
        413,
        Invalid,
        "Request too large - Request exceeds the maximum allowed number of bytes",
    ),
    rule(429, RateLimited, "Rate limit error - Your account has hit a rate limit"),
    rule(
        500,
        Unavailable,
        "API error - An unexpected error has occurred internal to Anthropic's systems",
    ),
    rule(
        529,
        Unavailable,
        "Overloaded error - Anthropic's API is temporarily overloaded",
    ),
];

static TABLE: StatusTable = StatusTable::new(RULES, "Anthropic API request failed");

#[derive(Debug, Default, Clone, Copy)]
pub struct AnthropicProbe;

impl AnthropicProbe {
    fn request(provider: &str, api_key: &str) -> Result<ProbeRequest, ProbeError> {
        Ok(ProbeRequest::post(ENDPOINT)
            .secret_header("x-api-key", api_key)?
            .header("anthropic-version", API_VERSION)?
            .header("accept", "application/json")?
            .json(json!({
                "model": MODEL,
                "max_tokens": ack::MAX_TOKENS,
                "system": ack::SYSTEM_PROMPT,
                "messages": [{"role": "user", "content": ack::prompt(provider)}],
            })))
    }

    fn completion(response: &ProbeResponse) -> Completion {
        Completion {
            text: response.str_at("/content/0/text").map(str::to_owned),
            prompt_tokens: response.pointer("/usage/input_tokens").and_then(Value::as_u64),
            completion_tokens: response.pointer("/usage/output_tokens").and_then(Value::as_u64),
            finish_reason: response.str_at("/stop_reason").map(str::to_owned),
        }
    }
}

impl Probe for AnthropicProbe {
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
            let response = ctx.send(Self::request(ctx.name(), api_key)?).await?;
            if !response.is_ok() {
                return Ok(TABLE.failure(ctx.name(), response.status_code, error_detail(&response)));
            }
            Ok(ack::judge(
                ctx.name(),
                MODEL,
                Subject::ApiKey,
                &Self::completion(&response),
                Metadata::new(),
            ))
        })
    }
}
