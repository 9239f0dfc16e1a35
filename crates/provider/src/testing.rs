//! Test doubles for probes and the base
//!
//! Enabled for this crate's own tests and, through the `testing` feature,
//! for downstream crates.

use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::BoxFuture;
use crate::base::ProbeError;
use crate::http::{ProbeRequest, ProbeResponse, Transport, TransportError, TransportErrorKind};
use crate::observer::ValidationObserver;
use crate::result::ValidationResult;
use crate::status::ValidationStatus;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Scripted transport: replays queued outcomes in order and records every
/// request. An exhausted script answers with a `Request` transport error.
#[derive(Debug, Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<Result<ProbeResponse, TransportError>>>,
    requests: Mutex<Vec<ProbeRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a JSON response.
    pub fn respond(self, status_code: u16, body: Value) -> Self {
        self.respond_raw(status_code, body.to_string())
    }

    /// Queue a response with an arbitrary body.
    pub fn respond_raw(self, status_code: u16, body: impl Into<String>) -> Self {
        lock(&self.script).push_back(Ok(ProbeResponse::new(status_code, body)));
        self
    }

    /// Queue a transport failure.
    pub fn fail(self, kind: TransportErrorKind, message: impl Into<String>) -> Self {
        lock(&self.script).push_back(Err(TransportError::new(kind, message)));
        self
    }

    /// Number of requests sent so far.
    pub fn calls(&self) -> usize {
        lock(&self.requests).len()
    }

    pub fn requests(&self) -> Vec<ProbeRequest> {
        lock(&self.requests).clone()
    }

    pub fn last_request(&self) -> Option<ProbeRequest> {
        lock(&self.requests).last().cloned()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: ProbeRequest) -> BoxFuture<'_, Result<ProbeResponse, TransportError>> {
        lock(&self.requests).push(request);
        let next = lock(&self.script).pop_front().unwrap_or_else(|| {
            Err(TransportError::new(
                TransportErrorKind::Request,
                "mock transport has no scripted response",
            ))
        });
        Box::pin(async move { next })
    }
}

/// Observer that keeps every event for assertions.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    failures: Mutex<Vec<(String, String)>>,
    completed: Mutex<Vec<(String, ValidationStatus, Duration)>>,
}

impl RecordingObserver {
    /// `(slug, error kind)` per reported probe failure.
    pub fn failures(&self) -> Vec<(String, String)> {
        lock(&self.failures).clone()
    }

    /// `(slug, status, elapsed)` per finished validation.
    pub fn completed(&self) -> Vec<(String, ValidationStatus, Duration)> {
        lock(&self.completed).clone()
    }
}

impl ValidationObserver for RecordingObserver {
    fn probe_failed(&self, slug: &str, error: &ProbeError) {
        lock(&self.failures).push((slug.to_string(), error.kind().to_string()));
    }

    fn validation_completed(&self, slug: &str, result: &ValidationResult, elapsed: Duration) {
        lock(&self.completed).push((slug.to_string(), result.status(), elapsed));
    }
}
