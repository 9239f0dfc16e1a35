//! Status taxonomy
//!
//! Closed set of outcome categories every provider result is classified into,
//! plus the two presentation derivations the front-end renders.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a credential validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// Provider accepted the credential
    Valid,
    /// Credential rejected or malformed
    Invalid,
    /// Credential recognised but lacks access (permissions, credits, moderation)
    Forbidden,
    /// Provider throttled the probe
    RateLimited,
    /// Provider outage or overload; retry later
    Unavailable,
    /// Unclassified failure
    Failed,
}

/// Coarse presentation bucket derived from a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusClass {
    Success,
    Error,
    Warning,
    Info,
}

impl ValidationStatus {
    pub const ALL: [ValidationStatus; 6] = [
        ValidationStatus::Valid,
        ValidationStatus::Invalid,
        ValidationStatus::Forbidden,
        ValidationStatus::RateLimited,
        ValidationStatus::Unavailable,
        ValidationStatus::Failed,
    ];

    /// Wire value, e.g. `rate_limited`.
    pub fn as_str(self) -> &'static str {
        match self {
            ValidationStatus::Valid => "valid",
            ValidationStatus::Invalid => "invalid",
            ValidationStatus::Forbidden => "forbidden",
            ValidationStatus::RateLimited => "rate_limited",
            ValidationStatus::Unavailable => "unavailable",
            ValidationStatus::Failed => "failed",
        }
    }

    pub fn class(self) -> StatusClass {
        match self {
            ValidationStatus::Valid => StatusClass::Success,
            ValidationStatus::Invalid => StatusClass::Error,
            ValidationStatus::Forbidden => StatusClass::Warning,
            ValidationStatus::RateLimited => StatusClass::Warning,
            ValidationStatus::Unavailable => StatusClass::Info,
            ValidationStatus::Failed => StatusClass::Error,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ValidationStatus::Valid => "Valid",
            ValidationStatus::Invalid => "Invalid",
            ValidationStatus::Forbidden => "Forbidden",
            ValidationStatus::RateLimited => "Rate Limited",
            ValidationStatus::Unavailable => "Unavailable",
            ValidationStatus::Failed => "Failed",
        }
    }
}

impl StatusClass {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusClass::Success => "success",
            StatusClass::Error => "error",
            StatusClass::Warning => "warning",
            StatusClass::Info => "info",
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for StatusClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
