//! xAI Grok
//!
//! The endpoint has no JSON mode for this model; the acknowledgment is
//! extracted from free text.

use provider::ValidationStatus::{Invalid, RateLimited, Unavailable};
use provider::{StatusRule, StatusTable, rule};

use crate::chat::ChatCompletions;

pub const ENDPOINT: &str = "https://api.x.ai/v1/chat/completions";
pub const MODEL: &str = "grok-3-mini";

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
        json_mode: false,
    }
}
