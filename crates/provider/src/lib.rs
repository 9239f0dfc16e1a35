//! Provider abstraction for credential validation
//!
//! Defines the `Provider` trait every third-party integration implements:
//! static identity (name, slug, category, links, required fields) plus one
//! `validate` operation that checks a credential set against the live API and
//! reports a uniform [`ValidationResult`].
//!
//! Concrete providers implement the narrower [`Probe`] trait and are wrapped in
//! [`ServiceProvider`], which owns the shared precondition and error handling.

pub mod base;
pub mod credentials;
pub mod descriptor;
pub mod fields;
pub mod http;
pub mod observer;
pub mod result;
pub mod status;
pub mod table;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use base::{Probe, ProbeContext, ProbeError, ServiceProvider, UNEXPECTED_ERROR_MESSAGE, required};
pub use credentials::Credentials;
pub use descriptor::ProviderDescriptor;
pub use fields::{RequiredField, RequiredFields};
pub use http::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_TIMEOUT, InvalidHeader, ProbeBody, ProbeRequest,
    ProbeResponse, ReqwestTransport, Transport, TransportError, TransportErrorKind,
};
pub use observer::{TracingObserver, ValidationObserver};
pub use result::{
    MISSING_FIELDS_CODE, Metadata, NOT_FOUND_PROVIDER, VALIDATION_ERROR_PROVIDER,
    ValidationResult,
};
pub use status::{StatusClass, ValidationStatus};
pub use table::{StatusRule, StatusTable, rule};

use std::future::Future;
use std::pin::Pin;

/// Boxed, sendable future used at every dyn-compatible seam.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A validatable third-party service.
///
/// Identity accessors are pure and read the provider's descriptor.
/// `validate` never fails: every outcome, including transport errors and
/// bugs in the probe, comes back as a [`ValidationResult`].
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility (`Arc<dyn Provider>`).
pub trait Provider: Send + Sync {
    fn descriptor(&self) -> &ProviderDescriptor;

    /// Human-readable name, also the `provider` tag on results.
    fn name(&self) -> &str {
        &self.descriptor().name
    }

    /// Stable URL-safe identifier.
    fn slug(&self) -> &str {
        &self.descriptor().slug
    }

    fn category(&self) -> &str {
        &self.descriptor().category
    }

    fn description(&self) -> &str {
        &self.descriptor().description
    }

    fn website_url(&self) -> Option<&str> {
        self.descriptor().website_url.as_deref()
    }

    fn api_keys_url(&self) -> Option<&str> {
        self.descriptor().api_keys_url.as_deref()
    }

    fn base_url(&self) -> Option<&str> {
        self.descriptor().base_url.as_deref()
    }

    fn documentation_url(&self) -> Option<&str> {
        self.descriptor().documentation_url.as_deref()
    }

    /// Credential fields `validate` needs, in display order.
    fn required_fields(&self) -> &RequiredFields;

    /// Check the credentials against the live API.
    fn validate<'a>(&'a self, credentials: &'a Credentials) -> BoxFuture<'a, ValidationResult>;
}
