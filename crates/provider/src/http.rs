//! HTTP probe helper
//!
//! Providers describe one outbound call as a [`ProbeRequest`] and get back a
//! uniform [`ProbeResponse`] envelope (status code, raw body, parsed JSON).
//! The [`Transport`] trait is the seam between probes and the network:
//! production uses [`ReqwestTransport`], tests substitute a mock.
//!
//! One attempt per call, bounded by the request timeout. No retries.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

use crate::BoxFuture;
use crate::result::Metadata;

/// Overall per-probe timeout used across providers.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection establishment timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A header value could not be encoded (e.g. a credential containing a newline).
#[derive(Debug, Clone, thiserror::Error)]
#[error("value for header `{header}` contains characters not allowed in HTTP headers")]
pub struct InvalidHeader {
    pub header: String,
}

/// Request body encodings used by probes.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ProbeBody {
    #[default]
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
}

impl ProbeBody {
    /// Content type and encoded bytes. Signing probes hash exactly these bytes.
    pub fn encode(&self) -> Option<(&'static str, Vec<u8>)> {
        match self {
            ProbeBody::Empty => None,
            ProbeBody::Json(value) => Some(("application/json", value.to_string().into_bytes())),
            ProbeBody::Form(pairs) => {
                let encoded = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(pairs)
                    .finish();
                Some(("application/x-www-form-urlencoded", encoded.into_bytes()))
            }
        }
    }
}

/// One outbound probe call.
#[derive(Debug, Clone)]
pub struct ProbeRequest {
    pub method: Method,
    pub url: String,
    /// Credential-bearing values are marked sensitive and print as `Sensitive`.
    pub headers: HeaderMap,
    pub body: ProbeBody,
    /// Falls back to the transport's configured timeout when unset.
    pub timeout: Option<Duration>,
}

impl ProbeRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: ProbeBody::Empty,
            timeout: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Add a non-secret header.
    pub fn header(self, name: &'static str, value: &str) -> Result<Self, InvalidHeader> {
        self.insert(name, value, false)
    }

    /// Add a header carrying a credential.
    pub fn secret_header(self, name: &'static str, value: &str) -> Result<Self, InvalidHeader> {
        self.insert(name, value, true)
    }

    pub fn bearer(self, token: &str) -> Result<Self, InvalidHeader> {
        self.insert(AUTHORIZATION.as_str(), &format!("Bearer {token}"), true)
    }

    pub fn basic_auth(self, username: &str, password: &str) -> Result<Self, InvalidHeader> {
        let encoded = STANDARD.encode(format!("{username}:{password}"));
        self.insert(AUTHORIZATION.as_str(), &format!("Basic {encoded}"), true)
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = ProbeBody::Json(body);
        self
    }

    pub fn form<K: Into<String>, V: Into<String>>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        self.body = ProbeBody::Form(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn insert(mut self, name: &str, value: &str, sensitive: bool) -> Result<Self, InvalidHeader> {
        let invalid = || InvalidHeader {
            header: name.to_string(),
        };
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
        let mut header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;
        header_value.set_sensitive(sensitive);
        self.headers.insert(header_name, header_value);
        Ok(self)
    }
}

/// Uniform response envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResponse {
    pub status_code: u16,
    pub body: String,
    /// Body parsed as JSON, `None` when empty or not JSON.
    pub data: Option<Value>,
}

impl ProbeResponse {
    pub fn new(status_code: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let data = serde_json::from_str(&body).ok();
        Self {
            status_code,
            body,
            data,
        }
    }

    /// Providers treat exactly 200 as the success signal.
    pub fn is_ok(&self) -> bool {
        self.status_code == 200
    }

    /// JSON pointer lookup into the parsed body.
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|data| data.pointer(pointer))
    }

    /// String at `pointer`, if present.
    pub fn str_at(&self, pointer: &str) -> Option<&str> {
        self.pointer(pointer).and_then(Value::as_str)
    }
}

/// Transport-level failure kinds (no HTTP status available).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Timeout,
    Connect,
    Body,
    Request,
}

impl TransportErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Connect => "connection",
            TransportErrorKind::Body => "body",
            TransportErrorKind::Request => "request",
        }
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The probe never produced an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} error: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// `{exception, message}` diagnostic metadata.
    pub fn metadata(&self) -> Metadata {
        crate::metadata! {
            "exception" => self.kind.as_str(),
            "message" => self.message,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        let kind = if e.is_timeout() {
            TransportErrorKind::Timeout
        } else if e.is_connect() {
            TransportErrorKind::Connect
        } else if e.is_body() || e.is_decode() {
            TransportErrorKind::Body
        } else {
            TransportErrorKind::Request
        };
        TransportError::new(kind, e.to_string())
    }
}

/// Performs one outbound call.
///
/// Uses `Pin<Box<dyn Future>>` for dyn-compatibility (`Arc<dyn Transport>`).
pub trait Transport: Send + Sync {
    fn send(&self, request: ProbeRequest) -> BoxFuture<'_, Result<ProbeResponse, TransportError>>;
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Build a client with a connect timeout; `timeout` bounds each call.
    pub fn new(timeout: Duration, connect_timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(TransportError::from)?;
        Ok(Self { client, timeout })
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: ProbeRequest) -> BoxFuture<'_, Result<ProbeResponse, TransportError>> {
        Box::pin(async move {
            let mut builder = self
                .client
                .request(request.method, &request.url)
                .timeout(request.timeout.unwrap_or(self.timeout))
                .headers(request.headers);

            if let Some((content_type, bytes)) = request.body.encode() {
                builder = builder.header(CONTENT_TYPE, content_type).body(bytes);
            }

            let response = builder.send().await?;
            let status_code = response.status().as_u16();
            let body = response.text().await?;
            Ok(ProbeResponse::new(status_code, body))
        })
    }
}
