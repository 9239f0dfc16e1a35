//! OpenAI-compatible chat completion probe
//!
//! Shared by every provider that speaks the `/chat/completions` dialect with
//! a Bearer key. Each provider supplies its endpoint, model and status table.

use provider::{
    BoxFuture, Credentials, Metadata, Probe, ProbeContext, ProbeError, ProbeRequest,
    ProbeResponse, RequiredFields, StatusTable, ValidationResult, required,
};
use serde_json::{Value, json};

use crate::ack::{self, Completion, Subject};

/// One chat-completions endpoint.
#[derive(Debug, Clone, Copy)]
pub struct ChatCompletions {
    pub endpoint: &'static str,
    pub model: &'static str,
    pub table: &'static StatusTable,
    /// Ask for `response_format: json_object`. Providers without JSON mode
    /// rely on the system prompt and free-text parsing.
    pub json_mode: bool,
}

impl ChatCompletions {
    pub fn request(&self, provider: &str, api_key: &str) -> Result<ProbeRequest, ProbeError> {
        let mut body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": ack::SYSTEM_PROMPT},
                {"role": "user", "content": ack::prompt(provider)},
            ],
            "max_tokens": ack::MAX_TOKENS,
            "temperature": 0,
        });
        if self.json_mode {
            body["response_format"] = json!({"type": "json_object"});
        }
        Ok(ProbeRequest::post(self.endpoint)
            .bearer(api_key)?
            .header("accept", "application/json")?
            .json(body))
    }

    fn classify(&self, provider: &str, response: &ProbeResponse) -> ValidationResult {
        if !response.is_ok() {
            return self
                .table
                .failure(provider, response.status_code, error_detail(response));
        }
        ack::judge(
            provider,
            self.model,
            Subject::ApiKey,
            &completion(response),
            Metadata::new(),
        )
    }
}

/// `error.message` in both the OpenAI and Anthropic error envelopes.
pub fn error_detail(response: &ProbeResponse) -> Option<&str> {
    response
        .str_at("/error/message")
        .or_else(|| response.str_at("/message"))
}

fn completion(response: &ProbeResponse) -> Completion {
    Completion {
        text: response
            .str_at("/choices/0/message/content")
            .map(str::to_owned),
        prompt_tokens: response.pointer("/usage/prompt_tokens").and_then(Value::as_u64),
        completion_tokens: response
            .pointer("/usage/completion_tokens")
            .and_then(Value::as_u64),
        finish_reason: response
            .str_at("/choices/0/finish_reason")
            .map(str::to_owned),
    }
}

impl Probe for ChatCompletions {
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
            let response = ctx.send(self.request(ctx.name(), api_key)?).await?;
            Ok(self.classify(ctx.name(), &response))
        })
    }
}
