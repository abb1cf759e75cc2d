//! Media resolution errors.

use photogate_core::{CoreError, MediaKey};
use photogate_store::StoreError;

/// Failure to resolve or list media.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// Neither the thumbnail nor the original exists.
    #[error("no object found for media key {key}")]
    NotFound {
        /// The requested key.
        key: MediaKey,
    },

    /// The store failed for a reason other than "key absent".
    #[error("object store unavailable")]
    StoreUnavailable(#[source] StoreError),

    /// The album or key is not a valid media path.
    #[error(transparent)]
    InvalidKey(#[from] CoreError),
}
