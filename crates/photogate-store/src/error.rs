//! Error types for object store access and URL presigning.

use std::fmt;

/// Classification of an object store failure.
///
/// Only [`StoreErrorKind::NoSuchKey`] means "the object is absent"; every
/// other kind means the store could not answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreErrorKind {
    /// The key does not exist in the bucket.
    NoSuchKey,
    /// The bucket does not exist.
    NoSuchBucket,
    /// The store refused the request.
    AccessDenied,
    /// The store did not answer in time.
    Timeout,
    /// A network or server-side failure that may succeed on retry.
    Transient,
    /// The request itself was rejected as invalid.
    InvalidRequest,
}

impl StoreErrorKind {
    /// The S3-style error code for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoSuchKey => "NoSuchKey",
            Self::NoSuchBucket => "NoSuchBucket",
            Self::AccessDenied => "AccessDenied",
            Self::Timeout => "RequestTimeout",
            Self::Transient => "ServiceUnavailable",
            Self::InvalidRequest => "InvalidRequest",
        }
    }
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed object store call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {bucket}/{key}: {message}")]
pub struct StoreError {
    /// What went wrong.
    pub kind: StoreErrorKind,
    /// The bucket the call targeted.
    pub bucket: String,
    /// The key or prefix the call targeted.
    pub key: String,
    /// Free-form detail from the store.
    pub message: String,
}

impl StoreError {
    /// Create an error with the kind's default message.
    #[must_use]
    pub fn new(kind: StoreErrorKind, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        let message = match kind {
            StoreErrorKind::NoSuchKey => "The specified key does not exist.",
            StoreErrorKind::NoSuchBucket => "The specified bucket does not exist.",
            StoreErrorKind::AccessDenied => "Access Denied.",
            StoreErrorKind::Timeout => "The store did not respond in time.",
            StoreErrorKind::Transient => "The store is temporarily unavailable.",
            StoreErrorKind::InvalidRequest => "Invalid request.",
        };
        Self {
            kind,
            bucket: bucket.into(),
            key: key.into(),
            message: message.to_owned(),
        }
    }

    /// Replace the message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Whether this error means the object does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == StoreErrorKind::NoSuchKey
    }
}

/// Errors from producing or checking a presigned URL.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PresignError {
    /// The requested lifetime is outside the allowed range.
    #[error("presign lifetime of {0}s is outside 1s..=604800s")]
    TtlOutOfRange(u64),

    /// The URL is missing parameters or cannot be parsed.
    #[error("malformed presigned URL: {0}")]
    Malformed(String),

    /// The URL was signed for a different credential or region.
    #[error("presigned URL credential does not match this store")]
    CredentialMismatch,

    /// The signature does not verify.
    #[error("presigned URL signature does not match")]
    SignatureDoesNotMatch,

    /// The URL's validity window has passed.
    #[error("presigned URL has expired")]
    Expired,
}
