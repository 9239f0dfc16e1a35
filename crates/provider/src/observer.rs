//! Observability collaborator injected into each provider

use std::time::Duration;
use tracing::{error, info};

use crate::base::ProbeError;
use crate::result::ValidationResult;

/// Receives validation events. Passed into the base at construction so tests
/// can assert on events without a global subscriber.
pub trait ValidationObserver: Send + Sync {
    /// A probe failed in a way its own error handling did not anticipate.
    fn probe_failed(&self, slug: &str, error: &ProbeError);

    /// Every `validate` call ends here exactly once.
    fn validation_completed(&self, slug: &str, result: &ValidationResult, elapsed: Duration) {
        let _ = (slug, result, elapsed);
    }
}

/// Default observer: structured `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ValidationObserver for TracingObserver {
    fn probe_failed(&self, slug: &str, error: &ProbeError) {
        error!(
            provider = slug,
            error = %error,
            error_type = error.kind(),
            context = ?error,
            "service provider validation error"
        );
    }

    fn validation_completed(&self, slug: &str, result: &ValidationResult, elapsed: Duration) {
        info!(
            provider = slug,
            status = %result.status(),
            code = result.code().unwrap_or(""),
            elapsed_ms = elapsed.as_millis() as u64,
            "validation completed"
        );
    }
}
