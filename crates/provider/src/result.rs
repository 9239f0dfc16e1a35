//! Normalized validation outcome
//!
//! `ValidationResult` can only be built through `success` and `failure`, so a
//! successful result always carries `Valid` and a failed one never does. The
//! consuming `with_*` methods return a new value; nothing mutates a result
//! after it has been handed out.

use serde::Serialize;
use serde::ser::Serializer;

use crate::status::{StatusClass, ValidationStatus};

/// Provider-defined auxiliary data. Shape is not comparable across providers.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Provider tag used for results produced before a provider was consulted.
pub const VALIDATION_ERROR_PROVIDER: &str = "validation_error";

/// Provider tag used by the HTTP boundary for unknown slugs.
pub const NOT_FOUND_PROVIDER: &str = "not_found";

/// Code attached to required-field precondition failures.
pub const MISSING_FIELDS_CODE: &str = "MISSING_FIELDS";

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    success: bool,
    status: ValidationStatus,
    /// `None` when built with a blank message; reads as the current status label.
    message: Option<String>,
    provider: String,
    code: Option<String>,
    metadata: Option<Metadata>,
}

impl ValidationResult {
    /// Credential accepted. Status is always `Valid`.
    pub fn success(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(true, ValidationStatus::Valid, provider.into(), message.into())
    }

    /// Credential not accepted. Status defaults to `Invalid`; override it with
    /// [`ValidationResult::with_status`].
    pub fn failure(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            false,
            ValidationStatus::Invalid,
            provider.into(),
            message.into(),
        )
    }

    fn new(success: bool, status: ValidationStatus, provider: String, message: String) -> Self {
        let message = (!message.trim().is_empty()).then_some(message);
        Self {
            success,
            status,
            message,
            provider,
            code: None,
            metadata: None,
        }
    }

    /// Set the status of a failed result. Ignored for successful results and
    /// for `Valid`, which only `success` may produce.
    pub fn with_status(mut self, status: ValidationStatus) -> Self {
        if !self.success && status != ValidationStatus::Valid {
            self.status = status;
        }
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn status(&self) -> ValidationStatus {
        self.status
    }

    /// Never empty; a blank message reads as the label of the final status.
    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or(self.status.label())
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    pub fn status_class(&self) -> StatusClass {
        self.status.class()
    }

    pub fn status_label(&self) -> &'static str {
        self.status.label()
    }
}

/// Flattened boundary shape. Absent optionals are omitted, never `null`.
#[derive(Serialize)]
struct WireResult<'a> {
    success: bool,
    status: ValidationStatus,
    message: &'a str,
    provider: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a Metadata>,
    status_class: StatusClass,
    status_label: &'static str,
}

impl Serialize for ValidationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireResult {
            success: self.success,
            status: self.status,
            message: self.message(),
            provider: &self.provider,
            code: self.code.as_deref(),
            metadata: self.metadata.as_ref(),
            status_class: self.status.class(),
            status_label: self.status.label(),
        }
        .serialize(serializer)
    }
}

/// Build a [`Metadata`] map from `key => value` pairs.
#[macro_export]
macro_rules! metadata {
    ($($key:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut map = $crate::Metadata::new();
        $( map.insert(::std::string::String::from($key), ::serde_json::json!($value)); )*
        map
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_is_always_valid() {
        let result = ValidationResult::success("OpenAI", "OpenAI API key is valid and working.");
        assert!(result.is_success());
        assert_eq!(result.status(), ValidationStatus::Valid);
        assert!(result.code().is_none());
        assert!(result.metadata().is_none());
    }

    #[test]
    fn failure_defaults_to_invalid() {
        let result = ValidationResult::failure("Groq", "Unauthorized");
        assert!(!result.is_success());
        assert_eq!(result.status(), ValidationStatus::Invalid);
    }

    #[test]
    fn failure_cannot_be_marked_valid() {
        let result = ValidationResult::failure("Groq", "nope").with_status(ValidationStatus::Valid);
        assert_eq!(result.status(), ValidationStatus::Invalid);

        let result = ValidationResult::failure("Groq", "slow down")
            .with_status(ValidationStatus::RateLimited);
        assert_eq!(result.status(), ValidationStatus::RateLimited);
    }

    #[test]
    fn success_ignores_status_override() {
        let result =
            ValidationResult::success("Exa", "ok").with_status(ValidationStatus::Unavailable);
        assert_eq!(result.status(), ValidationStatus::Valid);
        assert!(result.is_success());
    }

    #[test]
    fn empty_message_falls_back_to_label() {
        let result = ValidationResult::failure("Polar", "  ");
        assert_eq!(result.message(), "Invalid");
        let result = ValidationResult::success("Polar", "");
        assert_eq!(result.message(), "Valid");
    }

    #[test]
    fn empty_message_follows_status_override() {
        let result = ValidationResult::failure("Groq", "").with_status(ValidationStatus::Failed);
        assert_eq!(result.message(), "Failed");

        let result =
            ValidationResult::failure("Groq", "").with_status(ValidationStatus::RateLimited);
        assert_eq!(result.message(), ValidationStatus::RateLimited.label());
        assert_eq!(serde_json::to_value(&result).unwrap()["message"], result.status_label());

        let result = ValidationResult::failure("Groq", "Unauthorized")
            .with_status(ValidationStatus::Failed);
        assert_eq!(result.message(), "Unauthorized");
    }

    #[test]
    fn serializes_flattened_shape_with_derivations() {
        let result = ValidationResult::failure("OpenRouter", "Rate limited - You are being rate limited")
            .with_status(ValidationStatus::RateLimited)
            .with_code("429")
            .with_metadata(metadata! { "retry" => true });

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            json!({
                "success": false,
                "status": "rate_limited",
                "message": "Rate limited - You are being rate limited",
                "provider": "OpenRouter",
                "code": "429",
                "metadata": { "retry": true },
                "status_class": "warning",
                "status_label": "Rate Limited",
            })
        );
    }

    #[test]
    fn absent_optionals_are_omitted_not_null() {
        let json = serde_json::to_value(ValidationResult::success("PayPal", "ok")).unwrap();
        assert!(json.get("code").is_none());
        assert!(json.get("metadata").is_none());

        let json =
            serde_json::to_value(ValidationResult::success("PayPal", "ok").with_code("")).unwrap();
        assert_eq!(json["code"], "", "present-but-empty code must survive");
    }

    #[test]
    fn serialized_derivations_match_taxonomy() {
        for status in ValidationStatus::ALL {
            let result = if status == ValidationStatus::Valid {
                ValidationResult::success("p", "m")
            } else {
                ValidationResult::failure("p", "m").with_status(status)
            };
            let json = serde_json::to_value(&result).unwrap();
            assert_eq!(json["status"], status.as_str());
            assert_eq!(json["status_class"], status.class().as_str());
            assert_eq!(json["status_label"], status.label());
        }
    }

    #[test]
    fn metadata_macro_preserves_insertion_order() {
        let map = metadata! { "model" => "gpt-4o-mini", "total_tokens" => 42, "absent" => None::<u64> };
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, ["model", "total_tokens", "absent"]);
        assert_eq!(map["absent"], serde_json::Value::Null);
    }
}
