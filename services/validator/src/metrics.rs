//! Prometheus metrics exposition
//!
//! - `validations_total` (counter): labels `provider`, `status`
//! - `validation_duration_seconds` (histogram): label `provider`
//! - `validation_probe_errors_total` (counter): labels `provider`, `error_type`

use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};
use provider::{ProbeError, TracingObserver, ValidationObserver, ValidationResult};
use std::time::Duration;

const DURATION_METRIC: &str = "validation_duration_seconds";

/// 50ms up to the default 30s probe timeout.
const DURATION_BUCKETS: &[f64] = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0];

fn builder() -> Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full(DURATION_METRIC.to_string()), DURATION_BUCKETS)
}

/// Install the global Prometheus recorder and return the handle `/metrics`
/// renders from.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    builder()?.install_recorder()
}

/// Record one finished validation.
pub fn record_validation(provider: &str, status: &'static str, elapsed: Duration) {
    metrics::counter!("validations_total", "provider" => provider.to_string(), "status" => status)
        .increment(1);
    metrics::histogram!(DURATION_METRIC, "provider" => provider.to_string())
        .record(elapsed.as_secs_f64());
}

/// Record a probe that ended in an unexpected error.
pub fn record_probe_error(provider: &str, error_type: &'static str) {
    metrics::counter!(
        "validation_probe_errors_total",
        "provider" => provider.to_string(),
        "error_type" => error_type
    )
    .increment(1);
}

/// Logs through [`TracingObserver`] and records the matching metrics.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsObserver {
    logs: TracingObserver,
}

impl ValidationObserver for MetricsObserver {
    fn probe_failed(&self, slug: &str, error: &ProbeError) {
        self.logs.probe_failed(slug, error);
        record_probe_error(slug, error.kind());
    }

    fn validation_completed(&self, slug: &str, result: &ValidationResult, elapsed: Duration) {
        self.logs.validation_completed(slug, result, elapsed);
        record_validation(slug, result.status().as_str(), elapsed);
    }
}
