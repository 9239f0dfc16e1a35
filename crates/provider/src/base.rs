//! Base behavior shared by every provider
//!
//! Concrete providers only implement [`Probe`]: declare required fields and
//! run one live check. [`ServiceProvider`] wraps a probe with everything that
//! is common to all of them:
//!
//! 1. required-field precondition, checked before any network call
//! 2. delegation to the probe with a bounded-timeout [`ProbeContext`]
//! 3. conversion of probe errors and panics into a generic `Failed` result,
//!    reported through the injected [`ValidationObserver`]
//!
//! `validate` therefore never fails and never panics.

use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::credentials::Credentials;
use crate::descriptor::ProviderDescriptor;
use crate::fields::{RequiredField, RequiredFields};
use crate::http::{
    DEFAULT_TIMEOUT, InvalidHeader, ProbeRequest, ProbeResponse, Transport, TransportError,
};
use crate::observer::ValidationObserver;
use crate::result::{
    MISSING_FIELDS_CODE, VALIDATION_ERROR_PROVIDER, ValidationResult,
};
use crate::status::ValidationStatus;
use crate::{BoxFuture, Provider};

/// Message used when a probe fails in a way it did not classify itself.
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred while validating credentials";

/// Errors a probe lets escape. The base turns each into a result.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    InvalidHeader(#[from] InvalidHeader),

    #[error("internal provider error: {0}")]
    Internal(String),

    #[error("probe panicked: {0}")]
    Panicked(String),
}

impl ProbeError {
    /// Short classification used for metadata and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeError::Transport(e) => e.kind.as_str(),
            ProbeError::InvalidHeader(_) => "invalid_header",
            ProbeError::Internal(_) => "internal",
            ProbeError::Panicked(_) => "panic",
        }
    }
}

/// Provider-specific half of validation.
pub trait Probe: Send + Sync {
    /// Credential fields this provider needs, in display order.
    fn required_fields(&self) -> RequiredFields;

    /// Issue one minimal authenticated call and classify the outcome.
    ///
    /// Only called once every required field is present and non-empty.
    fn probe<'a>(
        &'a self,
        ctx: ProbeContext<'a>,
        credentials: &'a Credentials,
    ) -> BoxFuture<'a, Result<ValidationResult, ProbeError>>;
}

/// What a probe may use while running.
#[derive(Clone, Copy)]
pub struct ProbeContext<'a> {
    descriptor: &'a ProviderDescriptor,
    transport: &'a dyn Transport,
    timeout: Duration,
}

impl<'a> ProbeContext<'a> {
    /// Display name; tags every result the probe builds.
    pub fn name(&self) -> &'a str {
        &self.descriptor.name
    }

    pub fn slug(&self) -> &'a str {
        &self.descriptor.slug
    }

    pub fn descriptor(&self) -> &'a ProviderDescriptor {
        self.descriptor
    }

    /// Send one request, applying the provider timeout unless the request
    /// sets its own.
    pub async fn send(&self, mut request: ProbeRequest) -> Result<ProbeResponse, TransportError> {
        if request.timeout.is_none() {
            request.timeout = Some(self.timeout);
        }
        self.transport.send(request).await
    }
}

/// Read a required field inside a probe.
pub fn required<'c>(credentials: &'c Credentials, field: &str) -> Result<&'c str, ProbeError> {
    credentials
        .get(field)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ProbeError::Internal(format!("required field `{field}` not supplied")))
}

/// A descriptor bound to its probe.
pub struct ServiceProvider {
    descriptor: ProviderDescriptor,
    required_fields: RequiredFields,
    probe: Box<dyn Probe>,
    transport: Arc<dyn Transport>,
    observer: Arc<dyn ValidationObserver>,
    timeout: Duration,
}

impl ServiceProvider {
    pub fn new(
        descriptor: ProviderDescriptor,
        probe: Box<dyn Probe>,
        transport: Arc<dyn Transport>,
        observer: Arc<dyn ValidationObserver>,
    ) -> Self {
        let required_fields = probe.required_fields();
        Self {
            descriptor,
            required_fields,
            probe,
            transport,
            observer,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn missing_fields(missing: &[&RequiredField]) -> ValidationResult {
        let labels = missing
            .iter()
            .map(|field| field.label.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        ValidationResult::failure(
            VALIDATION_ERROR_PROVIDER,
            format!("Missing required fields: {labels}"),
        )
        .with_code(MISSING_FIELDS_CODE)
    }

    fn recover(&self, error: ProbeError) -> ValidationResult {
        if let ProbeError::InvalidHeader(ref invalid) = error {
            let label = self
                .required_fields
                .label(&invalid.header)
                .unwrap_or("Credential");
            return ValidationResult::failure(
                self.name(),
                format!("{label} contains characters that cannot be sent to {}", self.name()),
            )
            .with_metadata(crate::metadata! { "header" => invalid.header });
        }

        self.observer.probe_failed(self.slug(), &error);
        ValidationResult::failure(self.name(), UNEXPECTED_ERROR_MESSAGE)
            .with_status(ValidationStatus::Failed)
            .with_metadata(crate::metadata! {
                "exception" => error.kind(),
                "message" => error.to_string(),
            })
    }

    async fn run(&self, credentials: &Credentials) -> ValidationResult {
        let missing = self.required_fields.missing(credentials);
        if !missing.is_empty() {
            return Self::missing_fields(&missing);
        }

        let ctx = ProbeContext {
            descriptor: &self.descriptor,
            transport: self.transport.as_ref(),
            timeout: self.timeout,
        };
        match AssertUnwindSafe(self.probe.probe(ctx, credentials))
            .catch_unwind()
            .await
        {
            Ok(Ok(result)) => result,
            Ok(Err(error)) => self.recover(error),
            Err(panic) => self.recover(ProbeError::Panicked(panic_message(panic.as_ref()))),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl Provider for ServiceProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    fn required_fields(&self) -> &RequiredFields {
        &self.required_fields
    }

    fn validate<'a>(&'a self, credentials: &'a Credentials) -> BoxFuture<'a, ValidationResult> {
        Box::pin(async move {
            let started = Instant::now();
            let result = self.run(credentials).await;
            self.observer
                .validation_completed(self.slug(), &result, started.elapsed());
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::TransportErrorKind;
    use crate::table::{StatusRule, StatusTable, rule};
    use crate::testing::{MockTransport, RecordingObserver};
    use serde_json::json;

    const RULES: &[StatusRule] = &[rule(401, ValidationStatus::Invalid, "Invalid API key provided")];
    static TABLE: StatusTable = StatusTable::new(RULES, "Example API request failed");

    enum Behavior {
        Probe,
        Panic,
        Internal,
    }

    struct ExampleProbe {
        behavior: Behavior,
    }

    impl Probe for ExampleProbe {
        fn required_fields(&self) -> RequiredFields {
            RequiredFields::new([("api_key", "API Key"), ("org_id", "Organization ID")])
        }

        fn probe<'a>(
            &'a self,
            ctx: ProbeContext<'a>,
            credentials: &'a Credentials,
        ) -> BoxFuture<'a, Result<ValidationResult, ProbeError>> {
            Box::pin(async move {
                match self.behavior {
                    Behavior::Panic => panic!("probe exploded"),
                    Behavior::Internal => Err(ProbeError::Internal("bad state".into())),
                    Behavior::Probe => {
                        let api_key = required(credentials, "api_key")?;
                        let request = ProbeRequest::get("https://api.example.test/v1/me").bearer(api_key)?;
                        let response = ctx.send(request).await?;
                        if response.is_ok() {
                            Ok(ValidationResult::success(ctx.name(), "valid").with_code("200"))
                        } else {
                            Ok(TABLE.failure(ctx.name(), response.status_code, None))
                        }
                    }
                }
            })
        }
    }

    fn descriptor() -> ProviderDescriptor {
        serde_json::from_value(json!({
            "slug": "example",
            "name": "Example AI",
            "category": "ai",
            "description": "Example provider",
            "website_url": "https://example.test",
            "required_fields": {"api_key": "API Key", "org_id": "Organization ID"},
            "implementation": "example",
        }))
        .unwrap()
    }

    fn provider(
        behavior: Behavior,
        transport: Arc<MockTransport>,
        observer: Arc<RecordingObserver>,
    ) -> ServiceProvider {
        ServiceProvider::new(
            descriptor(),
            Box::new(ExampleProbe { behavior }),
            transport,
            observer,
        )
    }

    fn full_credentials() -> Credentials {
        [("api_key", "sk-1"), ("org_id", "org-1")].into_iter().collect()
    }

    #[tokio::test]
    async fn missing_fields_fail_fast_without_network() {
        let transport = Arc::new(MockTransport::new().respond(200, json!({})));
        let observer = Arc::new(RecordingObserver::default());
        let provider = provider(Behavior::Probe, transport.clone(), observer.clone());

        let credentials: Credentials = [("api_key", "")].into_iter().collect();
        let result = provider.validate(&credentials).await;

        assert!(!result.is_success());
        assert_eq!(result.status(), ValidationStatus::Invalid);
        assert_eq!(result.provider(), VALIDATION_ERROR_PROVIDER);
        assert_eq!(result.code(), Some(MISSING_FIELDS_CODE));
        assert_eq!(
            result.message(),
            "Missing required fields: API Key, Organization ID"
        );
        assert_eq!(transport.calls(), 0, "no probe may be sent");
        assert_eq!(observer.completed().len(), 1);
        assert!(observer.failures().is_empty());
    }

    #[tokio::test]
    async fn only_missing_fields_are_listed() {
        let transport = Arc::new(MockTransport::new());
        let provider = provider(
            Behavior::Probe,
            transport.clone(),
            Arc::new(RecordingObserver::default()),
        );

        let credentials: Credentials = [("api_key", "sk-1")].into_iter().collect();
        let result = provider.validate(&credentials).await;
        assert_eq!(result.message(), "Missing required fields: Organization ID");
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn probe_result_passes_through_with_timeout_applied() {
        let transport = Arc::new(MockTransport::new().respond(200, json!({"id": "me"})));
        let provider = provider(
            Behavior::Probe,
            transport.clone(),
            Arc::new(RecordingObserver::default()),
        )
        .with_timeout(Duration::from_secs(7));

        let result = provider.validate(&full_credentials()).await;
        assert!(result.is_success());
        assert_eq!(result.provider(), "Example AI");
        assert_eq!(transport.calls(), 1);
        let request = transport.last_request().unwrap();
        assert_eq!(request.timeout, Some(Duration::from_secs(7)));
        assert_eq!(request.headers["authorization"], "Bearer sk-1");
    }

    #[tokio::test]
    async fn table_classification_is_used_for_error_codes() {
        let transport = Arc::new(MockTransport::new().respond(401, json!({"error": "bad key"})));
        let provider = provider(
            Behavior::Probe,
            transport,
            Arc::new(RecordingObserver::default()),
        );

        let result = provider.validate(&full_credentials()).await;
        assert_eq!(result.status(), ValidationStatus::Invalid);
        assert_eq!(result.code(), Some("401"));
        assert_eq!(result.message(), "Invalid API key provided");
    }

    #[tokio::test]
    async fn transport_error_is_demoted_to_failed_and_reported() {
        let transport = Arc::new(
            MockTransport::new().fail(TransportErrorKind::Timeout, "operation timed out"),
        );
        let observer = Arc::new(RecordingObserver::default());
        let provider = provider(Behavior::Probe, transport, observer.clone());

        let result = provider.validate(&full_credentials()).await;
        assert!(!result.is_success());
        assert_eq!(result.status(), ValidationStatus::Failed);
        assert_eq!(result.message(), UNEXPECTED_ERROR_MESSAGE);
        assert!(result.code().is_none());
        let metadata = result.metadata().unwrap();
        assert_eq!(metadata["exception"], "timeout");
        assert!(
            metadata["message"]
                .as_str()
                .unwrap()
                .contains("operation timed out")
        );
        assert_eq!(
            observer.failures(),
            [("example".to_string(), "timeout".to_string())]
        );
    }

    #[tokio::test]
    async fn panicking_probe_never_escapes_validate() {
        let observer = Arc::new(RecordingObserver::default());
        let provider = provider(
            Behavior::Panic,
            Arc::new(MockTransport::new()),
            observer.clone(),
        );

        let result = provider.validate(&full_credentials()).await;
        assert_eq!(result.status(), ValidationStatus::Failed);
        assert_eq!(result.metadata().unwrap()["exception"], "panic");
        assert!(
            result.metadata().unwrap()["message"]
                .as_str()
                .unwrap()
                .contains("probe exploded")
        );
        assert_eq!(observer.failures().len(), 1);
    }

    #[tokio::test]
    async fn internal_errors_are_reported() {
        let observer = Arc::new(RecordingObserver::default());
        let provider = provider(
            Behavior::Internal,
            Arc::new(MockTransport::new()),
            observer.clone(),
        );

        let result = provider.validate(&full_credentials()).await;
        assert_eq!(result.status(), ValidationStatus::Failed);
        assert_eq!(observer.failures()[0].1, "internal");
    }

    #[tokio::test]
    async fn unsendable_credential_is_invalid_not_failed() {
        let transport = Arc::new(MockTransport::new());
        let observer = Arc::new(RecordingObserver::default());
        let provider = provider(Behavior::Probe, transport.clone(), observer.clone());

        let credentials: Credentials = [("api_key", "sk\n1"), ("org_id", "org")].into_iter().collect();
        let result = provider.validate(&credentials).await;
        assert_eq!(result.status(), ValidationStatus::Invalid);
        assert_eq!(transport.calls(), 0);
        assert!(observer.failures().is_empty());
    }

    #[test]
    fn identity_accessors_read_descriptor() {
        let provider = provider(
            Behavior::Probe,
            Arc::new(MockTransport::new()),
            Arc::new(RecordingObserver::default()),
        );
        assert_eq!(provider.name(), "Example AI");
        assert_eq!(provider.slug(), "example");
        assert_eq!(provider.category(), "ai");
        assert_eq!(provider.description(), "Example provider");
        assert_eq!(provider.website_url(), Some("https://example.test"));
        assert_eq!(provider.api_keys_url(), None);
        assert_eq!(provider.required_fields().len(), 2);
    }
}
