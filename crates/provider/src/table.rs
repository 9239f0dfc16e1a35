//! Per-provider status-code tables
//!
//! Each provider owns one `StatusTable`: hand-authored rules mapping the HTTP
//! codes it documents to a status and a user-facing message. Tables are policy
//! data and are not merged; the same code can mean different
//! things for different providers (402 is "forbidden" for DeepSeek but
//! "invalid" for OpenRouter).
//!
//! Lookup layers two cross-provider rules over the table:
//! 429 is always `RateLimited`, and any 5xx is always `Unavailable`.
//! Codes the table does not list fall back to `Failed`.

use crate::result::ValidationResult;
use crate::status::ValidationStatus;

/// Substituted into messages when the provider supplied no error text.
const UNKNOWN_DETAIL: &str = "Unknown error";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRule {
    pub code: u16,
    pub status: ValidationStatus,
    /// May contain `{code}` and `{detail}` placeholders.
    pub message: &'static str,
}

/// Shorthand for table literals.
pub const fn rule(code: u16, status: ValidationStatus, message: &'static str) -> StatusRule {
    StatusRule {
        code,
        status,
        message,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StatusTable {
    rules: &'static [StatusRule],
    fallback: &'static str,
}

impl StatusTable {
    pub const fn new(rules: &'static [StatusRule], fallback: &'static str) -> Self {
        Self { rules, fallback }
    }

    fn lookup(&self, code: u16) -> Option<&'static StatusRule> {
        self.rules.iter().find(|rule| rule.code == code)
    }

    pub fn status_for(&self, code: u16) -> ValidationStatus {
        if code == 429 {
            return ValidationStatus::RateLimited;
        }
        if (500..=599).contains(&code) {
            return ValidationStatus::Unavailable;
        }
        match self.lookup(code) {
            Some(rule) => rule.status,
            None => ValidationStatus::Failed,
        }
    }

    pub fn message_for(&self, code: u16, detail: Option<&str>) -> String {
        let template = self.lookup(code).map_or(self.fallback, |rule| rule.message);
        template
            .replace("{code}", &code.to_string())
            .replace("{detail}", detail.unwrap_or(UNKNOWN_DETAIL))
    }

    /// Failure result for an HTTP error response, tagged with the code.
    pub fn failure(&self, provider: &str, code: u16, detail: Option<&str>) -> ValidationResult {
        ValidationResult::failure(provider, self.message_for(code, detail))
            .with_status(self.status_for(code))
            .with_code(code.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::ValidationStatus::*;

    const RULES: &[StatusRule] = &[
        rule(401, Invalid, "Invalid credentials"),
        rule(402, Forbidden, "Insufficient credits"),
        rule(422, Invalid, "Validation Error - {detail}"),
        // Deliberately inconsistent entries: cross-provider rules win
        rule(429, Invalid, "Too many requests"),
        rule(503, Failed, "Overloaded"),
    ];

    static TABLE: StatusTable = StatusTable::new(RULES, "Unexpected response (Status: {code})");

    #[test]
    fn listed_codes_use_table_policy() {
        assert_eq!(TABLE.status_for(401), Invalid);
        assert_eq!(TABLE.status_for(402), Forbidden);
        assert_eq!(TABLE.message_for(402, None), "Insufficient credits");
    }

    #[test]
    fn rate_limit_is_always_rate_limited() {
        assert_eq!(TABLE.status_for(429), RateLimited);
        assert_eq!(TABLE.message_for(429, None), "Too many requests");
    }

    #[test]
    fn server_errors_are_always_unavailable() {
        assert_eq!(TABLE.status_for(503), Unavailable);
        assert_eq!(TABLE.status_for(500), Unavailable);
        assert_eq!(TABLE.status_for(599), Unavailable);
        assert_eq!(TABLE.message_for(504, None), "Unexpected response (Status: 504)");
    }

    #[test]
    fn unlisted_codes_fall_back_to_failed() {
        assert_eq!(TABLE.status_for(418), Failed);
        assert_eq!(TABLE.status_for(302), Failed);
        assert_eq!(TABLE.message_for(418, None), "Unexpected response (Status: 418)");
    }

    #[test]
    fn detail_is_interpolated() {
        assert_eq!(
            TABLE.message_for(422, Some("name: field required")),
            "Validation Error - name: field required"
        );
        assert_eq!(TABLE.message_for(422, None), "Validation Error - Unknown error");
    }

    #[test]
    fn failure_carries_code_and_status() {
        let result = TABLE.failure("Polar", 402, None);
        assert!(!result.is_success());
        assert_eq!(result.status(), Forbidden);
        assert_eq!(result.code(), Some("402"));
        assert_eq!(result.provider(), "Polar");
    }
}
