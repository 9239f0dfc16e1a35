//! Google Gemini generateContent

use provider::ValidationStatus::{Invalid, RateLimited, Unavailable};
use provider::{
    BoxFuture, Credentials, Metadata, Probe, ProbeContext, ProbeError, ProbeRequest,
    ProbeResponse, RequiredFields, StatusRule, StatusTable, ValidationResult, required, rule,
};
use serde_json::{Value, json};

use crate::ack::{self, Completion, Subject};
use crate::chat::error_detail;

pub const MODEL: &str = "gemini-1.5-flash";
pub const ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";

const RULES: &[StatusRule] = &[
    rule(
        400,
        Invalid,
        "Invalid request - The request was malformed or missing required parameters",
    ),
    rule(401, Invalid, "Authentication failed - Invalid API key provided"),
    rule(
        403,
        Invalid,
        "Permission denied - The API key does not have permission to access this resource",
    ),
    rule(404, Invalid, "Model not found - The specified model does not exist"),
    rule(429, RateLimited, "Rate limit exceeded - Too many requests, please try again later"),
    rule(500, Unavailable, "Internal server error - An unexpected error occurred on the server"),
    rule(502, Unavailable, "Bad gateway - The server received an invalid response"),
    rule(503, Unavailable, "Service unavailable - The service is temporarily unavailable"),
];

static TABLE: StatusTable = StatusTable::new(
    RULES,
    "An unexpected error occurred while validating the API key",
);

#[derive(Debug, Default, Clone, Copy)]
pub struct GeminiProbe;

impl GeminiProbe {
    fn request(provider: &str, api_key: &str) -> Result<ProbeRequest, ProbeError> {
        Ok(ProbeRequest::post(ENDPOINT)
            .secret_header("x-goog-api-key", api_key)?
            .json(json!({
                "systemInstruction": {"parts": [{"text": ack::SYSTEM_PROMPT}]},
                "contents": [{"role": "user", "parts": [{"text": ack::prompt(provider)}]}],
                "generationConfig": {
                    "responseMimeType": "application/json",
                    "maxOutputTokens": ack::MAX_TOKENS,
                },
            })))
    }

    fn completion(response: &ProbeResponse) -> Completion {
        Completion {
            text: response
                .str_at("/candidates/0/content/parts/0/text")
                .map(str::to_owned),
            prompt_tokens: response
                .pointer("/usageMetadata/promptTokenCount")
                .and_then(Value::as_u64),
            completion_tokens: response
                .pointer("/usageMetadata/candidatesTokenCount")
                .and_then(Value::as_u64),
            finish_reason: response
                .str_at("/candidates/0/finishReason")
                .map(str::to_owned),
        }
    }
}

impl Probe for GeminiProbe {
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
