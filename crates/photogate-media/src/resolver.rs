//! Media resolution: variant selection, thumbnail fallback, and listing.
//!
//! Resolution policy for `resolve(key, wants_thumbnail)`:
//!
//! 1. With `wants_thumbnail`, check `thumbnail_bucket/<key><suffix>`.
//!    Present selects the thumbnail. A `NoSuchKey` answer falls back to the
//!    original. Any other store failure is returned as
//!    [`MediaError::StoreUnavailable`] and never falls back.
//! 2. For the original, check `media_bucket/<key>` when `strict_originals`
//!    is set; absence is [`MediaError::NotFound`].
//! 3. Presign the selected object for `presign_ttl`.
//!
//! Every store call runs under `store_timeout`; expiry is reported as a
//! [`StoreErrorKind::Timeout`] store error.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use photogate_core::MediaKey;
use photogate_store::{ObjectStore, StoreError, StoreErrorKind};
use tracing::{debug, error, info, warn};
use typed_builder::TypedBuilder;

use crate::cache::ExistenceCache;
use crate::error::MediaError;

/// Resolver settings: bucket names, suffix, TTLs, and timeouts.
#[derive(Debug, Clone, TypedBuilder)]
pub struct ResolverConfig {
    /// Bucket holding originals.
    #[builder(default = String::from("media"), setter(into))]
    pub media_bucket: String,
    /// Bucket holding thumbnails.
    #[builder(default = String::from("thumbnails"), setter(into))]
    pub thumbnail_bucket: String,
    /// Appended to a media key to address its thumbnail.
    #[builder(default = String::from(".jpg"), setter(into))]
    pub thumbnail_suffix: String,
    /// Lifetime of returned URLs.
    #[builder(default = Duration::from_secs(60 * 60))]
    pub presign_ttl: Duration,
    /// Upper bound for each store call.
    #[builder(default = Duration::from_secs(3))]
    pub store_timeout: Duration,
    /// Check originals exist so absence is reported as not found.
    #[builder(default = true)]
    pub strict_originals: bool,
    /// Existence cache TTL; `None` disables the cache.
    #[builder(default = Some(Duration::from_secs(30)))]
    pub existence_cache_ttl: Option<Duration>,
    /// Existence cache bound.
    #[builder(default = 10_000)]
    pub existence_cache_capacity: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Which rendition of an asset is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// The generated thumbnail.
    Thumbnail,
    /// The full-resolution original.
    Original,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Thumbnail => f.write_str("thumbnail"),
            Self::Original => f.write_str("original"),
        }
    }
}

/// The outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Selected bucket.
    pub bucket: String,
    /// Selected object key.
    pub key: String,
    /// Selected rendition.
    pub variant: Variant,
    /// Presigned GET URL for the selected object.
    pub url: String,
    /// When `url` stops working.
    pub expires_at: DateTime<Utc>,
}

/// The immediate children of a prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    /// Children in store order, trailing `/` removed. Entries are the
    /// store's keys verbatim and may not be valid [`MediaKey`]s.
    pub entries: Vec<String>,
    /// Whether the listing stopped early because of a store failure.
    pub truncated: bool,
}

/// Resolves media keys to presigned URLs.
///
/// Holds no per-request state; one instance serves all requests.
#[derive(Debug)]
pub struct MediaResolver {
    store: Arc<dyn ObjectStore>,
    config: ResolverConfig,
    cache: Option<ExistenceCache>,
}

impl MediaResolver {
    /// Create a resolver over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, config: ResolverConfig) -> Self {
        let cache = config
            .existence_cache_ttl
            .filter(|ttl| !ttl.is_zero() && config.existence_cache_capacity > 0)
            .map(|ttl| ExistenceCache::new(ttl, config.existence_cache_capacity));
        Self {
            store,
            config,
            cache,
        }
    }

    /// The resolver settings.
    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve `key` to a presigned URL for the preferred variant.
    ///
    /// # Errors
    ///
    /// Returns [`MediaError::NotFound`] if no backing object exists, or
    /// [`MediaError::StoreUnavailable`] if the store fails or times out.
    pub async fn resolve(
        &self,
        key: &MediaKey,
        wants_thumbnail: bool,
    ) -> Result<Resolution, MediaError> {
        let (bucket, object_key, variant) = self.select(key, wants_thumbnail).await?;

        let presigned = self
            .bounded(
                &bucket,
                &object_key,
                self.store
                    .presign_get(&bucket, &object_key, self.config.presign_ttl),
            )
            .await
            .map_err(|err| {
                error!(bucket = %bucket, key = %object_key, error = %err, "presign failed");
                MediaError::StoreUnavailable(err)
            })?;

        debug!(bucket = %bucket, key = %object_key, variant = %variant, "media resolved");

        Ok(Resolution {
            bucket,
            key: object_key,
            variant,
            url: presigned.url,
            expires_at: presigned.expires_at,
        })
    }

    /// Pick `(bucket, key, variant)` without presigning.
    async fn select(
        &self,
        key: &MediaKey,
        wants_thumbnail: bool,
    ) -> Result<(String, String, Variant), MediaError> {
        if wants_thumbnail {
            let bucket = &self.config.thumbnail_bucket;
            let thumbnail_key = key.with_suffix(&self.config.thumbnail_suffix);
            match self.check_exists(bucket, &thumbnail_key).await {
                Ok(true) => return Ok((bucket.clone(), thumbnail_key, Variant::Thumbnail)),
                Ok(false) => {
                    info!(bucket = %bucket, key = %thumbnail_key, "thumbnail missing, falling back to original");
                }
                Err(err) => {
                    error!(bucket = %bucket, key = %thumbnail_key, error = %err, "thumbnail existence check failed");
                    return Err(MediaError::StoreUnavailable(err));
                }
            }
        }

        let bucket = &self.config.media_bucket;
        if self.config.strict_originals {
            match self.check_exists(bucket, key.as_str()).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!(bucket = %bucket, key = %key, "original missing");
                    return Err(MediaError::NotFound { key: key.clone() });
                }
                Err(err) => {
                    error!(bucket = %bucket, key = %key, error = %err, "original existence check failed");
                    return Err(MediaError::StoreUnavailable(err));
                }
            }
        }

        Ok((bucket.clone(), key.as_str().to_owned(), Variant::Original))
    }

    /// Existence check through the cache. Absence is never cached.
    async fn check_exists(&self, bucket: &str, key: &str) -> Result<bool, StoreError> {
        if self
            .cache
            .as_ref()
            .is_some_and(|cache| cache.contains(bucket, key))
        {
            return Ok(true);
        }

        let exists = self
            .bounded(bucket, key, self.store.exists(bucket, key))
            .await?;

        if let Some(cache) = self.cache.as_ref().filter(|_| exists) {
            cache.insert(bucket, key);
        }
        Ok(exists)
    }

    /// Run a store call under the configured timeout.
    async fn bounded<T>(
        &self,
        bucket: &str,
        key: &str,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        if let Ok(result) = tokio::time::timeout(self.config.store_timeout, call).await {
            result
        } else {
            warn!(bucket, key, timeout = ?self.config.store_timeout, "store call timed out");
            Err(StoreError::new(StoreErrorKind::Timeout, bucket, key))
        }
    }

    /// List the immediate children of `prefix` in the media bucket.
    ///
    /// `""` and `"/"` both mean the root. A failure or timeout part way
    /// through returns what was gathered so far with `truncated` set.
    pub async fn list_by_prefix(&self, prefix: &str) -> Listing {
        let prefix = if prefix == "/" { "" } else { prefix };
        let bucket = self.config.media_bucket.as_str();
        let mut stream = self.store.list(bucket, prefix);
        let mut listing = Listing::default();

        loop {
            let next = tokio::time::timeout(self.config.store_timeout, stream.next()).await;
            let entry = match next {
                Ok(None) => break,
                Ok(Some(Ok(entry))) => entry,
                Ok(Some(Err(err))) => {
                    warn!(bucket, prefix, gathered = listing.entries.len(), error = %err, "listing interrupted, returning partial results");
                    listing.truncated = true;
                    break;
                }
                Err(_) => {
                    warn!(bucket, prefix, gathered = listing.entries.len(), "listing timed out, returning partial results");
                    listing.truncated = true;
                    break;
                }
            };

            let trimmed = entry.strip_suffix('/').unwrap_or(&entry);
            listing.entries.push(trimmed.to_owned());
        }

        listing
    }

    /// List albums (children of the root).
    pub async fn list_albums(&self) -> Listing {
        self.list_by_prefix("").await
    }

    /// List the entries of one album.
    ///
    /// # Errors
    ///
    /// Returns [`MediaError::InvalidKey`] if `album` is not a single path
    /// segment.
    pub async fn list_album(&self, album: &str) -> Result<Listing, MediaError> {
        let album = MediaKey::new(album)?;
        if album.image().is_some() {
            return Err(photogate_core::CoreError::InvalidMediaKey {
                key: album.to_string(),
                reason: "album must be a single segment",
            }
            .into());
        }
        Ok(self.list_by_prefix(&format!("{album}/")).await)
    }
}
