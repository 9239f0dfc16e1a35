//! DeepSeek (OpenAI-compatible)
//!
//! 402 means the account is out of balance: the key works but cannot be
//! used, so it is `Forbidden` rather than `Invalid`.

use provider::ValidationStatus::{Forbidden, Invalid, RateLimited, Unavailable};
use provider::{StatusRule, StatusTable, rule};

use crate::chat::ChatCompletions;

pub const ENDPOINT: &str = "https://api.deepseek.com/chat/completions";
pub const MODEL: &str = "deepseek-chat";

const RULES: &[StatusRule] = &[
    rule(400, Invalid, "Invalid request format - Please check your input and try again"),
    rule(401, Invalid, "Authentication failed - Wrong API key provided"),
    rule(
        402,
        Forbidden,
        "Insufficient balance - Please check your account balance and top up if needed",
    ),
    rule(422, Invalid, "Invalid parameters - Your request contains invalid parameters"),
    rule(429, RateLimited, "Rate limit reached - You are sending requests too quickly"),
    rule(
        500,
        Unavailable,
        "Server error - Our server encountered an issue, please retry after a brief wait",
    ),
    rule(
        503,
        Unavailable,
        "Server overloaded - The server is overloaded due to high traffic, please retry later",
    ),
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
