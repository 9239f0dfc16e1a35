//! OpenAI chat completions

use provider::ValidationStatus::{Invalid, RateLimited, Unavailable};
use provider::{StatusRule, StatusTable, rule};

use crate::chat::ChatCompletions;

pub const ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const MODEL: &str = "gpt-4o-mini";

const RULES: &[StatusRule] = &[
    rule(400, Invalid, "Invalid request format or missing parameters"),
    rule(401, Invalid, "Invalid API key provided"),
    rule(403, Invalid, "Access forbidden - check your API key permissions"),
    rule(404, Invalid, "Requested resource not found"),
    rule(429, RateLimited, "Rate limit exceeded - please try again later"),
    rule(500, Unavailable, "OpenAI service temporarily unavailable"),
    rule(503, Unavailable, "OpenAI service is currently overloaded - please try again later"),
];

static TABLE: StatusTable = StatusTable::new(RULES, "OpenAI API request failed");

pub fn probe() -> ChatCompletions {
    ChatCompletions {
        endpoint: ENDPOINT,
        model: MODEL,
        table: &TABLE,
        json_mode: true,
    }
}
