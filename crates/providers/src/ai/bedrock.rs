//! Amazon Bedrock Converse API, SigV4-signed
//!
//! The region is interpolated into the endpoint host, so it is checked
//! before anything is signed or sent.

use chrono::Utc;
use provider::ValidationStatus::{Failed, Forbidden, Invalid, RateLimited, Unavailable};
use provider::{
    BoxFuture, Credentials, Probe, ProbeContext, ProbeError, ProbeRequest, ProbeResponse,
    RequiredFields, StatusRule, StatusTable, ValidationResult, metadata, required, rule,
};
use serde_json::{Value, json};

use super::sigv4::{self, AwsCredentials};
use crate::ack::{self, Completion, Subject};

pub const MODEL: &str = "anthropic.claude-3-haiku-20240307-v1:0";
const SERVICE: &str = "bedrock";

/// Optional credential field for temporary (STS) credentials.
pub const SESSION_TOKEN_FIELD: &str = "session_token";

const RULES: &[StatusRule] = &[
    rule(
        400,
        Invalid,
        "Validation error - The input fails to satisfy the constraints specified by Amazon Bedrock",
    ),
    rule(
        403,
        Forbidden,
        "Access denied - You do not have sufficient permissions to perform this action",
    ),
    rule(404, Invalid, "Resource not found - The requested resource could not be found"),
    rule(408, Unavailable, "Request timeout - The request took too long to process"),
    rule(424, Failed, "Model stream error - An error occurred while streaming the response"),
    rule(429, RateLimited, "Throttling - Request was denied due to exceeding account quotas"),
    rule(
        500,
        Unavailable,
        "Internal server error - The request processing failed due to a server error",
    ),
    rule(
        503,
        Unavailable,
        "Service unavailable - The service is temporarily unable to handle the request",
    ),
];

static TABLE: StatusTable = StatusTable::new(
    RULES,
    "An unexpected error occurred while validating the API key",
);

/// Regions are lowercase letters, digits and dashes (`us-east-1`).
pub fn is_valid_region(region: &str) -> bool {
    !region.is_empty()
        && region
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

pub fn converse_url(region: &str) -> String {
    format!("https://bedrock-runtime.{region}.amazonaws.com/model/{MODEL}/converse")
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BedrockProbe;

impl BedrockProbe {
    fn request(provider: &str, region: &str, credentials: AwsCredentials<'_>) -> Result<ProbeRequest, ProbeError> {
        let request = ProbeRequest::post(converse_url(region))
            .header("accept", "application/json")?
            .json(json!({
                "system": [{"text": ack::SYSTEM_PROMPT}],
                "messages": [{"role": "user", "content": [{"text": ack::prompt(provider)}]}],
                "inferenceConfig": {"maxTokens": ack::MAX_TOKENS, "temperature": 0},
            }));
        sigv4::sign(request, credentials, region, SERVICE, Utc::now())
    }

    fn completion(response: &ProbeResponse) -> Completion {
        Completion {
            text: response
                .str_at("/output/message/content/0/text")
                .map(str::to_owned),
            prompt_tokens: response.pointer("/usage/inputTokens").and_then(Value::as_u64),
            completion_tokens: response.pointer("/usage/outputTokens").and_then(Value::as_u64),
            finish_reason: response.str_at("/stopReason").map(str::to_owned),
        }
    }
}

impl Probe for BedrockProbe {
    fn required_fields(&self) -> RequiredFields {
        RequiredFields::new([
            ("access_key_id", "AWS Access Key ID"),
            ("secret_access_key", "AWS Secret Access Key"),
            ("region", "AWS Region (e.g., us-east-1)"),
        ])
    }

    fn probe<'a>(
        &'a self,
        ctx: ProbeContext<'a>,
        credentials: &'a Credentials,
    ) -> BoxFuture<'a, Result<ValidationResult, ProbeError>> {
        Box::pin(async move {
            let region = required(credentials, "region")?.trim();
            if !is_valid_region(region) {
                return Ok(ValidationResult::failure(
                    ctx.name(),
                    "Invalid AWS region format - expected a region such as us-east-1",
                )
                .with_metadata(metadata! { "region" => region }));
            }

            let aws = AwsCredentials {
                access_key_id: required(credentials, "access_key_id")?,
                secret_access_key: required(credentials, "secret_access_key")?,
                session_token: credentials
                    .get(SESSION_TOKEN_FIELD)
                    .filter(|token| !token.is_empty()),
            };
            let response = ctx.send(Self::request(ctx.name(), region, aws)?).await?;
            if !response.is_ok() {
                return Ok(TABLE.failure(
                    ctx.name(),
                    response.status_code,
                    response.str_at("/message"),
                ));
            }

            Ok(ack::judge(
                ctx.name(),
                MODEL,
                Subject::Credentials,
                &Self::completion(&response),
                metadata! { "region" => region },
            ))
        })
    }
}
