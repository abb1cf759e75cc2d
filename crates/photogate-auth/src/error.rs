//! Error types for session tokens and credential verification.

/// Reasons a presented session token is rejected.
///
/// Callers at the request boundary collapse all variants into a single
/// "unauthorized" outcome; the variant is kept for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// The token is not structurally well-formed.
    #[error("malformed session token")]
    Malformed,

    /// The signature does not verify against the current signing key.
    #[error("session token signature is invalid")]
    SignatureInvalid,

    /// The token's expiry is not in the future.
    #[error("session token has expired")]
    Expired,

    /// The token was explicitly revoked before its expiry.
    #[error("session token has been revoked")]
    Revoked,
}

/// Failure to produce a session token.
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    /// No usable signing key material was supplied.
    #[error("signing key unavailable: {0}")]
    KeyUnavailable(String),

    /// The claims could not be encoded.
    #[error("failed to encode token claims: {0}")]
    Encode(#[from] serde_json::Error),

    /// The expiry does not fit in the token's timestamp range.
    #[error("token lifetime out of range")]
    LifetimeOutOfRange,
}

/// Failure reported by a [`CredentialVerifier`](crate::CredentialVerifier).
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// Unknown user or wrong password; the two are deliberately not
    /// distinguished.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The credential store could not be consulted.
    #[error("credential store unavailable: {0}")]
    Unavailable(String),

    /// A password could not be hashed or a stored hash could not be read.
    #[error("password hashing failed: {0}")]
    Hashing(String),
}
