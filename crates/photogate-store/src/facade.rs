//! The object store contract the media resolver is written against.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

use crate::error::StoreError;

/// Metadata returned by a successful [`ObjectStore::stat`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Object key.
    pub key: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub last_modified: DateTime<Utc>,
}

/// A time-limited GET URL for one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedUrl {
    /// The full URL, including signature query parameters.
    pub url: String,
    /// When the URL stops working.
    pub expires_at: DateTime<Utc>,
}

/// An S3-compatible object store.
///
/// Implementations must be safe to call concurrently from many requests.
#[async_trait]
pub trait ObjectStore: Send + Sync + fmt::Debug {
    /// Look up an object's metadata.
    ///
    /// An absent object is reported as an error whose
    /// [`is_not_found`](StoreError::is_not_found) returns `true`.
    async fn stat(&self, bucket: &str, key: &str) -> Result<ObjectInfo, StoreError>;

    /// Whether an object exists.
    ///
    /// Absence is `Ok(false)`; any other failure is an error.
    async fn exists(&self, bucket: &str, key: &str) -> Result<bool, StoreError> {
        match self.stat(bucket, key).await {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Produce a presigned GET URL valid for `ttl`.
    ///
    /// Does not check that the object exists.
    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> Result<PresignedUrl, StoreError>;

    /// List the immediate children of `prefix`, using `/` as the delimiter.
    ///
    /// Objects are yielded by key; sub-prefixes are yielded with their
    /// trailing `/`. The stream may end with an error after yielding some
    /// entries.
    fn list<'a>(
        &'a self,
        bucket: &'a str,
        prefix: &'a str,
    ) -> BoxStream<'a, Result<String, StoreError>>;
}
