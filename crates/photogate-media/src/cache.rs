//! Bounded, time-expiring cache of objects known to exist.
//!
//! Only positive existence checks are cached, so an object uploaded after a
//! miss is seen on the next request. A stale entry for a deleted object
//! yields a URL that fails on fetch until the entry expires.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::trace;

/// `(bucket, key)` pairs confirmed present, with the time of the check.
///
/// The bound is checked before inserting, so concurrent inserts can
/// overshoot `capacity` by at most the number of concurrent callers.
#[derive(Debug)]
pub struct ExistenceCache {
    entries: DashMap<(String, String), Instant>,
    ttl: Duration,
    capacity: usize,
}

impl ExistenceCache {
    /// Create a cache holding at most `capacity` results for `ttl` each.
    #[must_use]
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            capacity,
        }
    }

    /// Whether `bucket/key` was seen present within the TTL.
    #[must_use]
    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        let cache_key = (bucket.to_owned(), key.to_owned());
        let Some(stored_at) = self.entries.get(&cache_key).map(|entry| *entry.value()) else {
            return false;
        };
        if stored_at.elapsed() < self.ttl {
            return true;
        }
        self.entries
            .remove_if(&cache_key, |_, at| at.elapsed() >= self.ttl);
        false
    }

    /// Record that `bucket/key` exists.
    ///
    /// When full, expired entries are purged first; if the cache is still
    /// full the result is not stored.
    pub fn insert(&self, bucket: &str, key: &str) {
        if self.entries.len() >= self.capacity {
            self.purge_expired();
            if self.entries.len() >= self.capacity {
                trace!(bucket, key, "existence cache full, skipping insert");
                return;
            }
        }
        self.entries
            .insert((bucket.to_owned(), key.to_owned()), Instant::now());
    }

    /// Drop expired entries. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, at| at.elapsed() < self.ttl);
        before.saturating_sub(self.entries.len())
    }

    /// Number of stored entries, fresh or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
