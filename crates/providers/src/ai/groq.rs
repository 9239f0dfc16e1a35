//! Groq (OpenAI-compatible)

use provider::ValidationStatus::{Invalid, RateLimited, Unavailable};
use provider::{StatusRule, StatusTable, rule};

use crate::chat::ChatCompletions;

pub const ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const MODEL: &str = "llama-3.3-70b-versatile";

const RULES: &[StatusRule] = &[
    rule(400, Invalid, "Bad request - Invalid or missing parameters in the request"),
    rule(401, Invalid, "Unauthorized - Invalid or missing API key"),
    rule(403, Invalid, "Forbidden - Access denied or insufficient permissions"),
    rule(404, Invalid, "Not found - The requested resource or model does not exist"),
    rule(422, Invalid, "Unprocessable entity - Invalid input data or parameters"),
    rule(429, RateLimited, "Rate limit exceeded - Too many requests, please try again later"),
    rule(500, Unavailable, "Internal server error - Unexpected error on the server"),
    rule(502, Unavailable, "Bad gateway - Invalid response from upstream server"),
    rule(503, Unavailable, "Service unavailable - The service is temporarily unavailable"),
    rule(504, Unavailable, "Gateway timeout - Request timeout from upstream server"),
];

static TABLE: StatusTable = StatusTable::new(
    RULES,
    "An unexpected error occurred while validating the API key",
);

pub fn probe() -> ChatCompletions {
    ChatCompletions {
        endpoint: ENDPOINT,
        model: MODEL,
        table: &TABLE,
        json_mode: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{VALID_ACK, completion_body, validate};
    use provider::ValidationStatus;
    use provider::testing::MockTransport;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn valid_key_hits_openai_compatible_endpoint() {
        let transport = Arc::new(MockTransport::new().respond(200, completion_body(VALID_ACK)));
        let result = validate("groq", "Groq", Box::new(probe()), transport.clone(), &[("api_key", "gsk_1")]).await;

        assert!(result.is_success());
        assert_eq!(result.metadata().unwrap()["model"], MODEL);
        assert_eq!(transport.last_request().unwrap().url, ENDPOINT);
    }

    #[tokio::test]
    async fn unprocessable_entity_is_invalid_and_unknown_code_failed() {
        let transport = Arc::new(
            MockTransport::new()
                .respond(422, json!({"error": {"message": "bad input"}}))
                .respond(409, json!({"error": {"message": "conflict"}})),
        );
        let invalid = validate("groq", "Groq", Box::new(probe()), transport.clone(), &[("api_key", "k")]).await;
        assert_eq!(invalid.status(), ValidationStatus::Invalid);
        assert_eq!(
            invalid.message(),
            "Unprocessable entity - Invalid input data or parameters"
        );

        let unknown = validate("groq", "Groq", Box::new(probe()), transport, &[("api_key", "k")]).await;
        assert_eq!(unknown.status(), ValidationStatus::Failed);
        assert_eq!(
            unknown.message(),
            "An unexpected error occurred while validating the API key"
        );
    }
}
