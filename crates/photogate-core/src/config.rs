//! Gateway configuration.
//!
//! Provides [`GatewayConfig`], the startup configuration consumed by the
//! session token service and the media resolution engine. Values are loaded
//! from environment variables; object-store settings use the `S3_*` names
//! (`S3_ENDPOINT`, `S3_BUCKET_MEDIA`, ...).

use std::time::Duration;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::{CoreError, CoreResult};

/// Longest presigned URL lifetime an S3-compatible store accepts (7 days).
pub const MAX_PRESIGN_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Gateway configuration.
///
/// Secrets (`signing_key`, `s3_secret_key`) are never serialized.
///
/// # Examples
///
/// ```
/// use photogate_core::GatewayConfig;
///
/// let config = GatewayConfig::default();
/// assert_eq!(config.token_ttl().as_secs(), 3600);
/// assert_eq!(config.thumbnail_suffix, ".jpg");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Token signing key material (hex, base64, or raw). `None` means a
    /// random per-process key.
    #[serde(skip_serializing, default)]
    #[builder(default, setter(strip_option))]
    pub signing_key: Option<String>,

    /// Session token lifetime in seconds.
    #[builder(default = 3600)]
    pub token_ttl_secs: u64,

    /// Presigned URL lifetime in seconds.
    #[builder(default = 3600)]
    pub presign_ttl_secs: u64,

    /// Object store endpoint, with or without scheme.
    #[builder(default = String::from("localhost:9000"))]
    pub s3_endpoint: String,

    /// Whether to use https when the endpoint has no scheme.
    #[builder(default = true)]
    pub s3_use_ssl: bool,

    /// Access key used for presigning.
    #[builder(default)]
    pub s3_access_key: String,

    /// Secret key used for presigning.
    #[serde(skip_serializing, default)]
    #[builder(default)]
    pub s3_secret_key: String,

    /// Region used in the SigV4 credential scope.
    #[builder(default = String::from("us-east-1"))]
    pub s3_region: String,

    /// Virtual-hosted-style URLs (`bucket.host/key`) instead of path-style.
    #[builder(default = false)]
    pub s3_virtual_hosting: bool,

    /// Bucket holding original assets.
    #[builder(default = String::from("media"))]
    pub media_bucket: String,

    /// Bucket holding generated thumbnails.
    #[builder(default = String::from("thumbnails"))]
    pub thumbnail_bucket: String,

    /// Suffix appended to a media key to address its thumbnail.
    #[builder(default = String::from(".jpg"))]
    pub thumbnail_suffix: String,

    /// Per-call object store timeout in milliseconds.
    #[builder(default = 3000)]
    pub store_timeout_ms: u64,

    /// Check originals exist so a missing asset is reported as not found.
    #[builder(default = true)]
    pub strict_originals: bool,

    /// Existence cache TTL in seconds; `0` disables the cache.
    #[builder(default = 30)]
    pub existence_cache_ttl_secs: u64,

    /// Maximum number of cached existence results.
    #[builder(default = 10_000)]
    pub existence_cache_capacity: usize,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `PHOTOGATE_SIGNING_KEY` | *(unset)* |
    /// | `PHOTOGATE_TOKEN_TTL_SECS` | `3600` |
    /// | `PHOTOGATE_PRESIGN_TTL_SECS` | `3600` |
    /// | `S3_ENDPOINT` | `localhost:9000` |
    /// | `S3_USE_SSL` | `true` |
    /// | `S3_ACCESSKEY` | *(empty)* |
    /// | `S3_SECRETKEY` | *(empty)* |
    /// | `S3_REGION` | `us-east-1` |
    /// | `S3_VIRTUAL_HOSTING` | `false` |
    /// | `S3_BUCKET_MEDIA` | `media` |
    /// | `S3_BUCKET_THUMBNAILS` | `thumbnails` |
    /// | `PHOTOGATE_THUMBNAIL_SUFFIX` | `.jpg` |
    /// | `PHOTOGATE_STORE_TIMEOUT_MS` | `3000` |
    /// | `PHOTOGATE_STRICT_ORIGINALS` | `true` |
    /// | `PHOTOGATE_EXISTENCE_CACHE_TTL_SECS` | `30` |
    /// | `PHOTOGATE_EXISTENCE_CACHE_CAPACITY` | `10000` |
    /// | `LOG_LEVEL` | `info` |
    ///
    /// Unparseable numbers keep their default.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("PHOTOGATE_SIGNING_KEY") {
            if !v.trim().is_empty() {
                config.signing_key = Some(v);
            }
        }
        set_parsed(&mut config.token_ttl_secs, "PHOTOGATE_TOKEN_TTL_SECS");
        set_parsed(&mut config.presign_ttl_secs, "PHOTOGATE_PRESIGN_TTL_SECS");
        if let Ok(v) = std::env::var("S3_ENDPOINT") {
            config.s3_endpoint = v;
        }
        if let Ok(v) = std::env::var("S3_USE_SSL") {
            config.s3_use_ssl = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("S3_ACCESSKEY") {
            config.s3_access_key = v;
        }
        if let Ok(v) = std::env::var("S3_SECRETKEY") {
            config.s3_secret_key = v;
        }
        if let Ok(v) = std::env::var("S3_REGION") {
            config.s3_region = v;
        }
        if let Ok(v) = std::env::var("S3_VIRTUAL_HOSTING") {
            config.s3_virtual_hosting = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("S3_BUCKET_MEDIA") {
            config.media_bucket = v;
        }
        if let Ok(v) = std::env::var("S3_BUCKET_THUMBNAILS") {
            config.thumbnail_bucket = v;
        }
        if let Ok(v) = std::env::var("PHOTOGATE_THUMBNAIL_SUFFIX") {
            config.thumbnail_suffix = v;
        }
        set_parsed(&mut config.store_timeout_ms, "PHOTOGATE_STORE_TIMEOUT_MS");
        if let Ok(v) = std::env::var("PHOTOGATE_STRICT_ORIGINALS") {
            config.strict_originals = parse_bool(&v);
        }
        set_parsed(
            &mut config.existence_cache_ttl_secs,
            "PHOTOGATE_EXISTENCE_CACHE_TTL_SECS",
        );
        set_parsed(
            &mut config.existence_cache_capacity,
            "PHOTOGATE_EXISTENCE_CACHE_CAPACITY",
        );
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }

    /// Check that the configuration can serve requests.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] for a zero token TTL, a presign TTL
    /// outside `1..=MAX_PRESIGN_TTL_SECS`, a zero store timeout, or an empty
    /// bucket name.
    pub fn validate(&self) -> CoreResult<()> {
        if self.token_ttl_secs == 0 {
            return Err(CoreError::Config("token TTL must be positive".to_owned()));
        }
        if !(1..=MAX_PRESIGN_TTL_SECS).contains(&self.presign_ttl_secs) {
            return Err(CoreError::Config(format!(
                "presign TTL of {}s is outside 1s..={MAX_PRESIGN_TTL_SECS}s",
                self.presign_ttl_secs
            )));
        }
        if self.store_timeout_ms == 0 {
            return Err(CoreError::Config("store timeout must be positive".to_owned()));
        }
        if self.media_bucket.is_empty() || self.thumbnail_bucket.is_empty() {
            return Err(CoreError::Config("bucket names must not be empty".to_owned()));
        }
        Ok(())
    }

    /// Session token lifetime.
    #[must_use]
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    /// Presigned URL lifetime.
    #[must_use]
    pub fn presign_ttl(&self) -> Duration {
        Duration::from_secs(self.presign_ttl_secs)
    }

    /// Per-call object store timeout.
    #[must_use]
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Existence cache TTL, or `None` when the cache is disabled.
    #[must_use]
    pub fn existence_cache_ttl(&self) -> Option<Duration> {
        (self.existence_cache_ttl_secs > 0 && self.existence_cache_capacity > 0)
            .then(|| Duration::from_secs(self.existence_cache_ttl_secs))
    }
}

/// Overwrite `target` with the parsed value of `var`, if present and valid.
fn set_parsed<T: std::str::FromStr>(target: &mut T, var: &str) {
    if let Ok(v) = std::env::var(var) {
        match v.trim().parse::<T>() {
            Ok(n) => *target = n,
            Err(_) => tracing::warn!(var, value = %v, "ignoring unparseable config value"),
        }
    }
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
