//! Denylist of revoked token ids.
//!
//! Tokens are otherwise stateless, so ending a session early needs a record
//! of the token id. Entries are kept only until the token's own expiry;
//! after that the token is rejected as expired anyway.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

/// Concurrent set of revoked token ids, each with the token's expiry.
#[derive(Debug, Default)]
pub struct RevocationList {
    /// Token id to expiry (unix seconds).
    entries: DashMap<String, i64>,
}

impl RevocationList {
    /// Create an empty denylist.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `token_id` as revoked until `expires_at`, and drop any
    /// entries that have already expired.
    pub fn revoke(&self, token_id: &str, expires_at: i64, now: DateTime<Utc>) {
        self.purge_expired(now);
        if expires_at > now.timestamp() {
            self.entries.insert(token_id.to_owned(), expires_at);
            debug!(token_id, expires_at, "token revoked");
        }
    }

    /// Whether `token_id` is currently revoked.
    #[must_use]
    pub fn is_revoked(&self, token_id: &str, now: DateTime<Utc>) -> bool {
        self.entries
            .get(token_id)
            .is_some_and(|expires_at| *expires_at > now.timestamp())
    }

    /// Remove entries whose token has expired. Returns how many were removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        let now = now.timestamp();
        self.entries.retain(|_, expires_at| *expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    /// Number of live entries (including any not yet purged).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the denylist is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
