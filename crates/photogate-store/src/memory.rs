//! In-memory [`ObjectStore`] for tests and local development.
//!
//! Buckets are sorted maps behind a read-write lock, held in a concurrent
//! map keyed by bucket name. Faults, listing failures, and latency can be
//! injected per bucket to exercise the resolver's error paths.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{StoreError, StoreErrorKind};
use crate::facade::{ObjectInfo, ObjectStore, PresignedUrl};
use crate::presign::{Presigner, PresignerConfig};

/// Delimiter used for non-recursive listings.
const DELIMITER: char = '/';

#[derive(Debug, Clone)]
struct StoredObject {
    data: Arc<[u8]>,
    last_modified: DateTime<Utc>,
}

type Bucket = Arc<RwLock<BTreeMap<String, StoredObject>>>;

/// Thread-safe in-memory object store.
///
/// # Examples
///
/// ```
/// use photogate_store::InMemoryObjectStore;
///
/// let store = InMemoryObjectStore::default();
/// store.create_bucket("media");
/// store.put_object("media", "vacation/1.jpg", b"jpeg".to_vec());
/// assert_eq!(store.object_count("media"), 1);
/// ```
#[derive(Debug)]
pub struct InMemoryObjectStore {
    buckets: DashMap<String, Bucket>,
    faults: DashMap<String, StoreErrorKind>,
    list_failures: DashMap<String, (usize, StoreErrorKind)>,
    latency: RwLock<Option<Duration>>,
    checks: AtomicUsize,
    presigner: Presigner,
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new(PresignerConfig {
            endpoint: "localhost:9000".to_owned(),
            use_ssl: false,
            access_key: "photogate".to_owned(),
            secret_key: "photogate-secret".to_owned(),
            region: "us-east-1".to_owned(),
            virtual_hosted: false,
        })
    }
}

impl InMemoryObjectStore {
    /// Create an empty store that presigns with `config`.
    #[must_use]
    pub fn new(config: PresignerConfig) -> Self {
        Self {
            buckets: DashMap::new(),
            faults: DashMap::new(),
            list_failures: DashMap::new(),
            latency: RwLock::new(None),
            checks: AtomicUsize::new(0),
            presigner: Presigner::new(config),
        }
    }

    /// Create a bucket if it does not already exist.
    pub fn create_bucket(&self, bucket: &str) {
        self.buckets.entry(bucket.to_owned()).or_default();
    }

    /// Store an object, creating the bucket if needed.
    pub fn put_object(&self, bucket: &str, key: &str, data: impl Into<Vec<u8>>) {
        let objects = Arc::clone(&self.buckets.entry(bucket.to_owned()).or_default());
        objects.write().insert(
            key.to_owned(),
            StoredObject {
                data: Arc::from(data.into()),
                last_modified: Utc::now(),
            },
        );
    }

    /// Remove an object. Returns whether it existed.
    pub fn remove_object(&self, bucket: &str, key: &str) -> bool {
        self.bucket(bucket)
            .is_some_and(|objects| objects.write().remove(key).is_some())
    }

    /// Number of objects in a bucket (zero if it does not exist).
    #[must_use]
    pub fn object_count(&self, bucket: &str) -> usize {
        self.bucket(bucket).map_or(0, |objects| objects.read().len())
    }

    /// Make every call against `bucket` fail with `kind`.
    pub fn inject_fault(&self, bucket: &str, kind: StoreErrorKind) {
        self.faults.insert(bucket.to_owned(), kind);
    }

    /// Make listings of `bucket` fail with `kind` after `entries` entries.
    pub fn fail_listing_after(&self, bucket: &str, entries: usize, kind: StoreErrorKind) {
        self.list_failures.insert(bucket.to_owned(), (entries, kind));
    }

    /// Remove all injected faults for `bucket`.
    pub fn clear_faults(&self, bucket: &str) {
        self.faults.remove(bucket);
        self.list_failures.remove(bucket);
    }

    /// Delay every stat call and every listed entry by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.write() = latency;
    }

    /// Number of [`stat`](ObjectStore::stat) calls served so far.
    #[must_use]
    pub fn existence_checks(&self) -> usize {
        self.checks.load(Ordering::Relaxed)
    }

    /// Download an object through a URL this store presigned.
    ///
    /// # Errors
    ///
    /// Returns [`StoreErrorKind::AccessDenied`] if the URL does not verify
    /// (including after expiry), or [`StoreErrorKind::NoSuchKey`] if the
    /// object is gone.
    pub fn fetch(&self, url: &str) -> Result<Vec<u8>, StoreError> {
        self.fetch_at(url, Utc::now())
    }

    /// [`fetch`](Self::fetch) as if the current time were `now`.
    ///
    /// # Errors
    ///
    /// See [`fetch`](Self::fetch).
    pub fn fetch_at(&self, url: &str, now: DateTime<Utc>) -> Result<Vec<u8>, StoreError> {
        let (bucket, key) = self.presigner.verify(url, now).map_err(|e| {
            StoreError::new(StoreErrorKind::AccessDenied, "", url).with_message(e.to_string())
        })?;
        let objects = self
            .bucket(&bucket)
            .ok_or_else(|| StoreError::new(StoreErrorKind::NoSuchBucket, &bucket, &key))?;
        let objects = objects.read();
        objects
            .get(&key)
            .map(|object| object.data.to_vec())
            .ok_or_else(|| StoreError::new(StoreErrorKind::NoSuchKey, &bucket, &key))
    }

    fn bucket(&self, bucket: &str) -> Option<Bucket> {
        self.buckets.get(bucket).map(|entry| Arc::clone(entry.value()))
    }

    fn check_fault(&self, bucket: &str, key: &str) -> Result<Bucket, StoreError> {
        if let Some(kind) = self.faults.get(bucket) {
            return Err(StoreError::new(*kind, bucket, key).with_message("injected fault"));
        }
        self.bucket(bucket)
            .ok_or_else(|| StoreError::new(StoreErrorKind::NoSuchBucket, bucket, key))
    }

    async fn delay(&self) {
        let latency = *self.latency.read();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    /// Immediate children of `prefix`, objects and sub-prefixes merged in
    /// key order.
    fn children(objects: &BTreeMap<String, StoredObject>, prefix: &str) -> Vec<String> {
        let mut entries = BTreeSet::new();
        for key in objects.keys() {
            let Some(rest) = key.strip_prefix(prefix).filter(|rest| !rest.is_empty()) else {
                continue;
            };
            match rest.find(DELIMITER) {
                Some(pos) => {
                    entries.insert(format!("{prefix}{}{DELIMITER}", &rest[..pos]));
                }
                None => {
                    entries.insert(key.clone());
                }
            }
        }
        entries.into_iter().collect()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn stat(&self, bucket: &str, key: &str) -> Result<ObjectInfo, StoreError> {
        self.checks.fetch_add(1, Ordering::Relaxed);
        self.delay().await;

        let objects = self.check_fault(bucket, key)?;
        let objects = objects.read();
        let object = objects
            .get(key)
            .ok_or_else(|| StoreError::new(StoreErrorKind::NoSuchKey, bucket, key))?;

        debug!(bucket, key, "stat hit");
        Ok(ObjectInfo {
            key: key.to_owned(),
            size: object.data.len() as u64,
            last_modified: object.last_modified,
        })
    }

    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> Result<PresignedUrl, StoreError> {
        self.presigner
            .presign_get(bucket, key, ttl, Utc::now())
            .map_err(|e| {
                StoreError::new(StoreErrorKind::InvalidRequest, bucket, key)
                    .with_message(e.to_string())
            })
    }

    fn list<'a>(
        &'a self,
        bucket: &'a str,
        prefix: &'a str,
    ) -> BoxStream<'a, Result<String, StoreError>> {
        let entries: Vec<Result<String, StoreError>> = match self.check_fault(bucket, prefix) {
            Err(err) => vec![Err(err)],
            Ok(objects) => {
                let children = Self::children(&objects.read(), prefix);
                match self.list_failures.get(bucket).map(|entry| *entry.value()) {
                    Some((after, kind)) if after < children.len() => children
                        .into_iter()
                        .take(after)
                        .map(Ok)
                        .chain(std::iter::once(Err(StoreError::new(kind, bucket, prefix)
                            .with_message("listing interrupted"))))
                        .collect(),
                    _ => children.into_iter().map(Ok).collect(),
                }
            }
        };

        stream::iter(entries)
            .then(move |entry| async move {
                self.delay().await;
                entry
            })
            .boxed()
    }
}
