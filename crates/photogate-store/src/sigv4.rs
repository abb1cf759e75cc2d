//! AWS Signature Version 4 primitives for query-string signing.
//!
//! ```text
//! CanonicalRequest = GET\n<uri>\n<sorted query>\nhost:<host>\n\nhost\nUNSIGNED-PAYLOAD
//! StringToSign     = AWS4-HMAC-SHA256\n<timestamp>\n<scope>\nhex(sha256(CanonicalRequest))
//! Signature        = hex(HMAC(SigningKey, StringToSign))
//! ```

use hmac::{Hmac, KeyInit, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha2::{Digest, Sha256};

/// The only supported signing algorithm.
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Service name in the credential scope.
pub const SERVICE: &str = "s3";

/// Payload hash used by presigned requests.
pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

/// Timestamp format for `X-Amz-Date`.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Date format for the credential scope.
pub const DATE_FORMAT: &str = "%Y%m%d";

/// Everything except RFC 3986 unreserved characters is encoded.
pub(crate) const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

type HmacSha256 = Hmac<Sha256>;

/// Percent-encode a single value (path segment or query value).
#[must_use]
pub fn uri_encode(input: &str) -> String {
    utf8_percent_encode(input, URI_ENCODE_SET).to_string()
}

/// Canonical URI for a raw object path: each `/`-separated segment
/// encoded on its own.
///
/// The input is the unencoded path, so a literal `%` in a key is encoded
/// as `%25` rather than read as an escape.
///
/// # Examples
///
/// ```
/// use photogate_store::sigv4::canonical_uri;
///
/// assert_eq!(canonical_uri("/media/a b/1.jpg"), "/media/a%20b/1.jpg");
/// assert_eq!(canonical_uri("/media/100%25.jpg"), "/media/100%2525.jpg");
/// assert_eq!(canonical_uri(""), "/");
/// ```
#[must_use]
pub fn canonical_uri(path: &str) -> String {
    if path.is_empty() || path == "/" {
        return "/".to_owned();
    }
    path.split('/').map(uri_encode).collect::<Vec<_>>().join("/")
}

/// Canonical query string: parameters sorted by name then value, raw
/// values preserved. `X-Amz-Signature` is dropped.
#[must_use]
pub fn canonical_query(query: &str) -> String {
    let mut params: Vec<(&str, &str)> = query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|param| param.split_once('=').unwrap_or((param, "")))
        .filter(|(name, _)| *name != "X-Amz-Signature")
        .collect();
    params.sort_unstable();
    params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Canonical request for a presigned GET that signs only `host`.
///
/// `encoded_uri` is the path exactly as it appears on the wire (see
/// [`canonical_uri`]); it is not re-encoded.
#[must_use]
pub fn canonical_request(encoded_uri: &str, query: &str, host: &str) -> String {
    let uri = if encoded_uri.is_empty() { "/" } else { encoded_uri };
    format!(
        "GET\n{uri}\n{}\nhost:{}\n\nhost\n{UNSIGNED_PAYLOAD}",
        canonical_query(query),
        host.trim()
    )
}

/// `date/region/s3/aws4_request`.
#[must_use]
pub fn credential_scope(date: &str, region: &str) -> String {
    format!("{date}/{region}/{SERVICE}/aws4_request")
}

/// String to sign for a canonical request.
#[must_use]
pub fn string_to_sign(timestamp: &str, scope: &str, canonical_request: &str) -> String {
    let hash = hex::encode(Sha256::digest(canonical_request.as_bytes()));
    format!("{ALGORITHM}\n{timestamp}\n{scope}\n{hash}")
}

/// Derive the per-day signing key from the secret key.
#[must_use]
pub fn derive_signing_key(secret_key: &str, date: &str, region: &str) -> Vec<u8> {
    let date_key = hmac_sha256(format!("AWS4{secret_key}").as_bytes(), date.as_bytes());
    let region_key = hmac_sha256(&date_key, region.as_bytes());
    let service_key = hmac_sha256(&region_key, SERVICE.as_bytes());
    hmac_sha256(&service_key, b"aws4_request")
}

/// Hex-encoded signature of `string_to_sign`.
#[must_use]
pub fn sign(signing_key: &[u8], string_to_sign: &str) -> String {
    hex::encode(hmac_sha256(signing_key, string_to_sign.as_bytes()))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can accept keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}
