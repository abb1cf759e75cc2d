//! Presigned GET URLs (SigV4 query-string authentication).
//!
//! A [`Presigner`] produces URLs that grant read access to one object for a
//! bounded time, and can check URLs it produced. Presigning is a local
//! computation: no store round trip is made.
//!
//! The query parameters carried by a presigned URL:
//!
//! - `X-Amz-Algorithm` - always `AWS4-HMAC-SHA256`
//! - `X-Amz-Credential` - `AKID/date/region/s3/aws4_request`
//! - `X-Amz-Date` - signing time (`YYYYMMDDTHHMMSSZ`)
//! - `X-Amz-Expires` - validity in seconds
//! - `X-Amz-SignedHeaders` - always `host`
//! - `X-Amz-Signature` - hex signature

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::error::PresignError;
use crate::facade::PresignedUrl;
use crate::sigv4::{
    ALGORITHM, DATE_FORMAT, SERVICE, TIMESTAMP_FORMAT, canonical_request, canonical_uri,
    credential_scope, derive_signing_key, sign, string_to_sign, uri_encode,
};

/// Shortest lifetime a presigned URL may have.
pub const MIN_PRESIGN_TTL: Duration = Duration::from_secs(1);

/// Longest lifetime a presigned URL may have (7 days).
pub const MAX_PRESIGN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Where and as whom URLs are signed.
#[derive(Clone)]
pub struct PresignerConfig {
    /// Store endpoint, `host[:port]`.
    pub endpoint: String,
    /// Use `https` in generated URLs.
    pub use_ssl: bool,
    /// Access key id.
    pub access_key: String,
    /// Secret access key.
    pub secret_key: String,
    /// Signing region.
    pub region: String,
    /// Put the bucket in the host name instead of the path.
    pub virtual_hosted: bool,
}

impl fmt::Debug for PresignerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresignerConfig")
            .field("endpoint", &self.endpoint)
            .field("use_ssl", &self.use_ssl)
            .field("access_key", &self.access_key)
            .field("region", &self.region)
            .field("virtual_hosted", &self.virtual_hosted)
            .finish_non_exhaustive()
    }
}

/// Signs and verifies presigned GET URLs.
#[derive(Debug, Clone)]
pub struct Presigner {
    config: PresignerConfig,
}

impl Presigner {
    /// Create a presigner.
    #[must_use]
    pub fn new(config: PresignerConfig) -> Self {
        Self { config }
    }

    /// The signing configuration.
    #[must_use]
    pub fn config(&self) -> &PresignerConfig {
        &self.config
    }

    /// Presign a GET of `bucket/key`, valid from `now` for `ttl`.
    ///
    /// # Errors
    ///
    /// Returns [`PresignError::TtlOutOfRange`] if `ttl` is outside
    /// [`MIN_PRESIGN_TTL`]..=[`MAX_PRESIGN_TTL`], or
    /// [`PresignError::Malformed`] for an empty bucket or key.
    pub fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<PresignedUrl, PresignError> {
        let secs = ttl.as_secs();
        if !(MIN_PRESIGN_TTL.as_secs()..=MAX_PRESIGN_TTL.as_secs()).contains(&secs) {
            return Err(PresignError::TtlOutOfRange(secs));
        }
        if bucket.is_empty() || key.is_empty() {
            return Err(PresignError::Malformed("empty bucket or key".to_owned()));
        }

        let timestamp = now.format(TIMESTAMP_FORMAT).to_string();
        let date = now.format(DATE_FORMAT).to_string();
        let scope = credential_scope(&date, &self.config.region);
        let credential = format!("{}/{scope}", self.config.access_key);

        let (host, path) = self.locate(bucket, key);
        let encoded_path = canonical_uri(&path);
        let query = format!(
            "X-Amz-Algorithm={ALGORITHM}\
             &X-Amz-Credential={}\
             &X-Amz-Date={timestamp}\
             &X-Amz-Expires={secs}\
             &X-Amz-SignedHeaders=host",
            uri_encode(&credential)
        );

        let request = canonical_request(&encoded_path, &query, &host);
        let signing_key = derive_signing_key(&self.config.secret_key, &date, &self.config.region);
        let signature = sign(&signing_key, &string_to_sign(&timestamp, &scope, &request));

        let scheme = if self.config.use_ssl { "https" } else { "http" };
        let expires_in = chrono::Duration::try_seconds(
            i64::try_from(secs).map_err(|_| PresignError::TtlOutOfRange(secs))?,
        )
        .ok_or(PresignError::TtlOutOfRange(secs))?;

        debug!(bucket, key, expires = secs, "presigned GET URL");

        Ok(PresignedUrl {
            url: format!(
                "{scheme}://{host}{encoded_path}?{query}&X-Amz-Signature={signature}"
            ),
            expires_at: now + expires_in,
        })
    }

    /// Check a URL produced by [`presign_get`](Self::presign_get) and
    /// return the `(bucket, key)` it grants access to.
    ///
    /// # Errors
    ///
    /// Returns a [`PresignError`] if the URL is malformed, was signed for
    /// another credential, has expired, or its signature does not match.
    pub fn verify(&self, url: &str, now: DateTime<Utc>) -> Result<(String, String), PresignError> {
        let uri: http::Uri = url
            .parse()
            .map_err(|e| PresignError::Malformed(format!("{e}")))?;
        let host = uri
            .authority()
            .map(http::uri::Authority::as_str)
            .ok_or_else(|| PresignError::Malformed("missing host".to_owned()))?;
        let path = uri.path();
        let query = uri.query().unwrap_or("");

        let params: HashMap<&str, String> = query
            .split('&')
            .filter_map(|param| {
                let (name, value) = param.split_once('=')?;
                Some((name, decode(value)))
            })
            .collect();
        let param = |name: &str| required(&params, name);

        if param("X-Amz-Algorithm")? != ALGORITHM {
            return Err(PresignError::Malformed("unsupported algorithm".to_owned()));
        }
        if param("X-Amz-SignedHeaders")? != "host" {
            return Err(PresignError::Malformed("unexpected signed headers".to_owned()));
        }

        let credential: Vec<&str> = param("X-Amz-Credential")?.splitn(5, '/').collect();
        let [access_key, date, region, service, terminator] = credential[..] else {
            return Err(PresignError::Malformed("invalid credential".to_owned()));
        };
        if service != SERVICE || terminator != "aws4_request" {
            return Err(PresignError::Malformed("invalid credential scope".to_owned()));
        }
        if access_key != self.config.access_key || region != self.config.region {
            return Err(PresignError::CredentialMismatch);
        }

        let timestamp = param("X-Amz-Date")?;
        let signed_at = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
            .map_err(|_| PresignError::Malformed("invalid X-Amz-Date".to_owned()))?
            .and_utc();
        let expires: i64 = param("X-Amz-Expires")?
            .parse()
            .map_err(|_| PresignError::Malformed("invalid X-Amz-Expires".to_owned()))?;
        let expires_at = chrono::Duration::try_seconds(expires)
            .and_then(|window| signed_at.checked_add_signed(window))
            .ok_or_else(|| PresignError::Malformed("invalid X-Amz-Expires".to_owned()))?;
        if now > expires_at {
            return Err(PresignError::Expired);
        }

        let request = canonical_request(path, query, host);
        let signing_key = derive_signing_key(&self.config.secret_key, date, region);
        let expected = sign(
            &signing_key,
            &string_to_sign(timestamp, &credential_scope(date, region), &request),
        );
        let provided = param("X-Amz-Signature")?;
        if !bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
            debug!(expected = %expected, provided = %provided, "presigned URL signature mismatch");
            return Err(PresignError::SignatureDoesNotMatch);
        }

        self.bucket_and_key(host, path)
    }

    /// Host and unencoded path for an object.
    fn locate(&self, bucket: &str, key: &str) -> (String, String) {
        if self.config.virtual_hosted {
            (format!("{bucket}.{}", self.config.endpoint), format!("/{key}"))
        } else {
            (self.config.endpoint.clone(), format!("/{bucket}/{key}"))
        }
    }

    fn bucket_and_key(&self, host: &str, path: &str) -> Result<(String, String), PresignError> {
        let path = path.strip_prefix('/').unwrap_or(path);
        let (bucket, key) = if self.config.virtual_hosted {
            let bucket = host
                .strip_suffix(self.config.endpoint.as_str())
                .and_then(|rest| rest.strip_suffix('.'))
                .ok_or_else(|| PresignError::Malformed("host is not a bucket endpoint".to_owned()))?;
            (bucket, path)
        } else {
            path.split_once('/')
                .ok_or_else(|| PresignError::Malformed("path has no key".to_owned()))?
        };
        if bucket.is_empty() || key.is_empty() {
            return Err(PresignError::Malformed("empty bucket or key".to_owned()));
        }
        Ok((decode(bucket), decode(key)))
    }
}

fn required<'a>(params: &'a HashMap<&str, String>, name: &str) -> Result<&'a str, PresignError> {
    params
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| PresignError::Malformed(format!("missing {name}")))
}

fn decode(input: &str) -> String {
    percent_encoding::percent_decode_str(input)
        .decode_utf8_lossy()
        .into_owned()
}
