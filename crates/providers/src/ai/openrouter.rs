//! OpenRouter credits lookup
//!
//! Reading the credit balance is free and needs a valid key, so it is a
//! cheaper probe than a completion.

use provider::ValidationStatus::{Failed, Forbidden, Invalid, RateLimited, Unavailable};
use provider::{
    BoxFuture, Credentials, Probe, ProbeContext, ProbeError, ProbeRequest, RequiredFields,
    StatusRule, StatusTable, ValidationResult, metadata, required, rule,
};

pub const ENDPOINT: &str = "https://openrouter.ai/api/v1/credits";

const RULES: &[StatusRule] = &[
    rule(400, Invalid, "Bad Request - Invalid or missing parameters, or CORS issue"),
    rule(
        401,
        Invalid,
        "Invalid credentials - OAuth session expired or disabled/invalid API key",
    ),
    rule(
        402,
        Invalid,
        "Insufficient credits - Your account or API key has insufficient credits",
    ),
    rule(
        403,
        Forbidden,
        "Content flagged - Your chosen model requires moderation and your input was flagged",
    ),
    rule(408, Unavailable, "Request timeout - Your request timed out"),
    rule(429, RateLimited, "Rate limited - You are being rate limited"),
    rule(
        502,
        Unavailable,
        "Bad Gateway - Your chosen model is down or we received an invalid response from it",
    ),
    rule(
        503,
        Unavailable,
        "Service Unavailable - No available model provider meets your routing requirements",
    ),
];

static TABLE: StatusTable = StatusTable::new(RULES, "An unexpected error occurred: {detail}");

#[derive(Debug, Default, Clone, Copy)]
pub struct OpenRouterProbe;

impl Probe for OpenRouterProbe {
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
                return Ok(TABLE.failure(
                    ctx.name(),
                    response.status_code,
                    response.str_at("/error/message"),
                ));
            }

            if response.pointer("/data").is_none() {
                return Ok(ValidationResult::failure(
                    ctx.name(),
                    format!("Unexpected response from {} API", ctx.name()),
                )
                .with_metadata(metadata! { "response_body" => response.body }));
            }

            Ok(
                ValidationResult::success(
                    ctx.name(),
                    format!("{} API key is valid and working.", ctx.name()),
                )
                .with_code("200")
                .with_metadata(metadata! { "credits" => response.data }),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::validate;
    use provider::testing::MockTransport;
    use provider::{TransportErrorKind, ValidationStatus};
    use serde_json::json;
    use std::sync::Arc;

    async fn run(transport: Arc<MockTransport>) -> ValidationResult {
        validate(
            "openrouter",
            "OpenRouter",
            Box::new(OpenRouterProbe),
            transport,
            &[("api_key", "sk-or-1")],
        )
        .await
    }

    #[tokio::test]
    async fn credits_are_echoed_on_success() {
        let transport = Arc::new(MockTransport::new().respond(
            200,
            json!({"data": {"total_credits": 10.5, "total_usage": 2.25}}),
        ));
        let result = run(transport.clone()).await;

        assert!(result.is_success());
        assert_eq!(
            result.metadata().unwrap()["credits"]["data"]["total_credits"],
            10.5
        );
        let request = transport.last_request().unwrap();
        assert_eq!(request.method, "GET");
        assert_eq!(request.url, ENDPOINT);
    }

    #[tokio::test]
    async fn ok_status_without_credits_is_invalid() {
        let result = run(Arc::new(MockTransport::new().respond_raw(200, ""))).await;
        assert!(!result.is_success());
        assert_eq!(result.status(), ValidationStatus::Invalid);
        assert_eq!(result.message(), "Unexpected response from OpenRouter API");
        assert_eq!(result.metadata().unwrap()["response_body"], "");

        let transport = Arc::new(MockTransport::new().respond(200, json!({"credits": 3})));
        assert_eq!(run(transport).await.status(), ValidationStatus::Invalid);
    }

    #[tokio::test]
    async fn payment_required_is_invalid_and_moderation_forbidden() {
        let transport = Arc::new(
            MockTransport::new()
                .respond(402, json!({"error": {"code": 402, "message": "Insufficient credits"}}))
                .respond(403, json!({"error": {"code": 403, "message": "flagged"}})),
        );
        assert_eq!(run(transport.clone()).await.status(), ValidationStatus::Invalid);
        assert_eq!(run(transport).await.status(), ValidationStatus::Forbidden);
    }

    #[tokio::test]
    async fn unlisted_code_interpolates_provider_message() {
        let transport = Arc::new(MockTransport::new().respond(
            418,
            json!({"error": {"code": 418, "message": "I'm a teapot"}}),
        ));
        let result = run(transport).await;
        assert_eq!(result.status(), ValidationStatus::Failed);
        assert_eq!(result.message(), "An unexpected error occurred: I'm a teapot");

        let bare = run(Arc::new(MockTransport::new().respond_raw(418, ""))).await;
        assert_eq!(bare.message(), "An unexpected error occurred: Unknown error");
    }

    #[tokio::test]
    async fn request_timeout_code_is_unavailable() {
        let result = run(Arc::new(MockTransport::new().respond(408, json!({})))).await;
        assert_eq!(result.status(), ValidationStatus::Unavailable);
    }

    #[tokio::test]
    async fn connection_failure_is_failed_with_details() {
        let transport = Arc::new(
            MockTransport::new().fail(TransportErrorKind::Connect, "dns error: no such host"),
        );
        let result = run(transport).await;

        assert_eq!(result.status(), ValidationStatus::Failed);
        assert_eq!(result.message(), "Connection error: dns error: no such host");
        assert!(result.code().is_none());
        let metadata = result.metadata().unwrap();
        assert_eq!(metadata["exception"], "connection");
        assert_eq!(metadata["message"], "dns error: no such host");
    }
}
