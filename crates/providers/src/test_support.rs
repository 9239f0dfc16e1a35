//! Fixtures shared by provider tests

use provider::testing::{MockTransport, RecordingObserver};
use provider::{
    Credentials, Probe, Provider, ProviderDescriptor, ServiceProvider, ValidationResult,
};
use serde_json::{Value, json};
use std::sync::Arc;

pub const VALID_ACK: &str = r#"{"status":"success","provider":"Test","is_valid":true,"message":"API key is valid and working"}"#;

pub const REJECTED_ACK: &str = r#"{"status":"error","provider":"Test","is_valid":false,"message":"API key is not valid"}"#;

/// OpenAI-style completion body whose content is `content`.
pub fn completion_body(content: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "model": "test-model",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop",
        }],
        "usage": {"prompt_tokens": 31, "completion_tokens": 19, "total_tokens": 50},
    })
}

pub fn descriptor(slug: &str, name: &str, probe: &dyn Probe) -> ProviderDescriptor {
    ProviderDescriptor {
        slug: slug.into(),
        name: name.into(),
        category: "ai".into(),
        description: format!("{name} test descriptor"),
        website_url: None,
        api_keys_url: None,
        base_url: None,
        documentation_url: None,
        required_fields: probe.required_fields(),
        implementation: slug.into(),
    }
}

/// Wrap `probe` in the base with a scripted transport.
pub fn service(
    slug: &str,
    name: &str,
    probe: Box<dyn Probe>,
    transport: Arc<MockTransport>,
) -> ServiceProvider {
    ServiceProvider::new(
        descriptor(slug, name, probe.as_ref()),
        probe,
        transport,
        Arc::new(RecordingObserver::default()),
    )
}

pub async fn validate(
    slug: &str,
    name: &str,
    probe: Box<dyn Probe>,
    transport: Arc<MockTransport>,
    credentials: &[(&str, &str)],
) -> ValidationResult {
    let credentials: Credentials = credentials.iter().copied().collect();
    service(slug, name, probe, transport)
        .validate(&credentials)
        .await
}
