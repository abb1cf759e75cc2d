//! Error types for the Photogate core.

/// Core error type for shared Photogate types and configuration.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A media key is empty or contains an empty path segment.
    #[error("invalid media key {key:?}: {reason}")]
    InvalidMediaKey {
        /// The rejected key.
        key: String,
        /// Why the key was rejected.
        reason: &'static str,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
