//! JSON acknowledgment checks for model-backed probes
//!
//! Chat-style probes ask the model to answer with a small JSON object. An
//! HTTP 200 alone is not enough: the reply must parse and carry
//! `is_valid: true`, otherwise the credential is reported `Invalid`.

use provider::{Metadata, ValidationResult, metadata};
use serde_json::{Map, Value};

/// Keys every acknowledgment must carry.
pub const ACK_KEYS: [&str; 4] = ["status", "provider", "is_valid", "message"];

pub const SYSTEM_PROMPT: &str = "You are a validation service. Respond with a valid JSON object \
containing the validation result. Do not include any other text in your response.";

/// Upper bound on generated tokens; the acknowledgment is tiny.
pub const MAX_TOKENS: u32 = 100;

pub fn prompt(provider: &str) -> String {
    format!(
        "Validate this API key by responding with a JSON object containing: status=\"success\", \
         provider=\"{provider}\", is_valid=true, message=\"API key is valid and working\""
    )
}

/// What a successful model call told us.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub text: Option<String>,
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
    pub finish_reason: Option<String>,
}

/// How results refer to the checked credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    ApiKey,
    Credentials,
}

impl Subject {
    fn valid(self, provider: &str) -> String {
        match self {
            Subject::ApiKey => format!("{provider} API key is valid and working."),
            Subject::Credentials => format!("{provider} credentials are valid and working."),
        }
    }

    fn invalid(self, provider: &str) -> String {
        match self {
            Subject::ApiKey => format!("{provider} API key validation failed."),
            Subject::Credentials => format!("{provider} credentials validation failed."),
        }
    }
}

/// Parse a model reply into an acknowledgment object.
///
/// Tolerates Markdown code fences and prose around the object. Returns `None`
/// when no object with all [`ACK_KEYS`] can be found.
pub fn parse(text: &str) -> Option<Map<String, Value>> {
    let candidate = strip_fences(text.trim());
    let object = match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(object)) => object,
        _ => {
            let start = candidate.find('{')?;
            let end = candidate.rfind('}')?;
            if end <= start {
                return None;
            }
            match serde_json::from_str::<Value>(&candidate[start..=end]) {
                Ok(Value::Object(object)) => object,
                _ => return None,
            }
        }
    };
    ACK_KEYS
        .iter()
        .all(|key| object.get(*key).is_some_and(|value| !value.is_null()))
        .then_some(object)
}

fn strip_fences(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Judge a 200 response.
///
/// `extra` is merged into success metadata right after the model name.
pub fn judge(
    provider: &str,
    model: &str,
    subject: Subject,
    completion: &Completion,
    extra: Metadata,
) -> ValidationResult {
    let acknowledgment = completion.text.as_deref().and_then(parse);
    let acknowledged = acknowledgment
        .as_ref()
        .is_some_and(|ack| ack.get("is_valid") == Some(&Value::Bool(true)));

    if !acknowledged {
        return ValidationResult::failure(provider, subject.invalid(provider)).with_metadata(
            metadata! {
                "validation_data" => acknowledgment,
                "response_text" => completion.text,
            },
        );
    }

    let total_tokens = completion
        .prompt_tokens
        .zip(completion.completion_tokens)
        .map(|(prompt, completion)| prompt + completion);

    let mut details = metadata! { "model" => model };
    details.extend(extra);
    details.extend(metadata! {
        "prompt_tokens" => completion.prompt_tokens,
        "completion_tokens" => completion.completion_tokens,
        "total_tokens" => total_tokens,
        "finish_reason" => completion.finish_reason,
    });

    ValidationResult::success(provider, subject.valid(provider))
        .with_code("200")
        .with_metadata(details)
}
