//! AWS Signature Version 4 request signing

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use provider::{ProbeError, ProbeRequest};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use url::Url;

type HmacSha256 = Hmac<Sha256>;

/// Long-term or temporary AWS credentials.
#[derive(Clone, Copy)]
pub struct AwsCredentials<'a> {
    pub access_key_id: &'a str,
    pub secret_access_key: &'a str,
    pub session_token: Option<&'a str>,
}

/// Sign `request` for `service` in `region`, adding the `authorization`,
/// `x-amz-date`, `x-amz-content-sha256` and (when present)
/// `x-amz-security-token` headers.
///
/// Signs the exact bytes the transport will send for the request body.
pub fn sign(
    request: ProbeRequest,
    credentials: AwsCredentials<'_>,
    region: &str,
    service: &str,
    now: DateTime<Utc>,
) -> Result<ProbeRequest, ProbeError> {
    let url = Url::parse(&request.url)
        .map_err(|e| ProbeError::Internal(format!("cannot sign `{}`: {e}", request.url)))?;
    // The transport only sends content-type with a body, so only sign it then.
    let (content_type, payload) = match request.body.encode() {
        Some((content_type, payload)) => (Some(content_type), payload),
        None => (None, Vec::new()),
    };

    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date_stamp = now.format("%Y%m%d").to_string();
    let payload_hash = sha256_hex(&payload);

    let mut headers = vec![
        ("host", canonical_host(&url)?),
        ("x-amz-content-sha256", payload_hash.clone()),
        ("x-amz-date", amz_date.clone()),
    ];
    if let Some(content_type) = content_type {
        headers.push(("content-type", content_type.to_string()));
    }
    if let Some(token) = credentials.session_token {
        headers.push(("x-amz-security-token", token.to_string()));
    }
    headers.sort_by(|left, right| left.0.cmp(right.0));

    let signed_headers = headers
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(";");
    let mut canonical_headers = String::new();
    for (name, value) in &headers {
        let _ = writeln!(canonical_headers, "{name}:{}", value.trim());
    }

    let canonical_request = format!(
        "{method}\n{uri}\n{query}\n{canonical_headers}\n{signed_headers}\n{payload_hash}",
        method = request.method.as_str(),
        uri = canonical_uri(&url),
        query = canonical_query(&url),
    );
    let scope = format!("{date_stamp}/{region}/{service}/aws4_request");
    let string_to_sign = format!(
        "AWS4-HMAC-SHA256\n{amz_date}\n{scope}\n{}",
        sha256_hex(canonical_request.as_bytes())
    );
    let signature = hex::encode(signature(
        credentials.secret_access_key,
        &date_stamp,
        region,
        service,
        &string_to_sign,
    )?);

    let authorization = format!(
        "AWS4-HMAC-SHA256 Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
        credentials.access_key_id
    );

    let mut signed = request
        .secret_header("authorization", &authorization)?
        .header("x-amz-date", &amz_date)?
        .header("x-amz-content-sha256", &payload_hash)?;
    if let Some(token) = credentials.session_token {
        signed = signed.secret_header("x-amz-security-token", token)?;
    }
    Ok(signed)
}

fn canonical_host(url: &Url) -> Result<String, ProbeError> {
    let host = url
        .host_str()
        .ok_or_else(|| ProbeError::Internal(format!("`{url}` has no host")))?;
    Ok(url
        .port()
        .map_or_else(|| host.to_string(), |port| format!("{host}:{port}")))
}

fn canonical_uri(url: &Url) -> String {
    let segments = url
        .path_segments()
        .map(|parts| parts.map(percent_encode).collect::<Vec<_>>())
        .unwrap_or_default();
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

fn canonical_query(url: &Url) -> String {
    let mut pairs = url
        .query_pairs()
        .map(|(key, value)| (percent_encode(&key), percent_encode(&value)))
        .collect::<Vec<_>>();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// RFC 3986 unreserved characters pass through; everything else is `%XX`.
fn percent_encode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            encoded.push(char::from(byte));
        } else {
            let _ = write!(encoded, "%{byte:02X}");
        }
    }
    encoded
}

fn signature(
    secret_access_key: &str,
    date_stamp: &str,
    region: &str,
    service: &str,
    string_to_sign: &str,
) -> Result<Vec<u8>, ProbeError> {
    let key_date = hmac_sha256(
        format!("AWS4{secret_access_key}").as_bytes(),
        date_stamp.as_bytes(),
    )?;
    let key_region = hmac_sha256(&key_date, region.as_bytes())?;
    let key_service = hmac_sha256(&key_region, service.as_bytes())?;
    let key_signing = hmac_sha256(&key_service, b"aws4_request")?;
    hmac_sha256(&key_signing, string_to_sign.as_bytes())
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, ProbeError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| ProbeError::Internal(format!("failed to initialize HMAC: {e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
