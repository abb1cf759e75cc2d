//! The gateway's failure taxonomy.
//!
//! Every failure from the services below is classified into one of these
//! kinds. The transport layer maps kinds to responses; the gateway itself
//! has no notion of status codes.

use photogate_auth::{SigningError, TokenError};
use photogate_core::{CoreError, MediaKey};
use photogate_media::MediaError;
use photogate_store::StoreError;

/// A failed gateway operation.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Bad credentials. Unknown user and wrong password are not
    /// distinguished.
    #[error("authentication failed")]
    AuthenticationFailure,

    /// The session token was rejected. Displays as a single outcome; the
    /// specific reason is kept as the source.
    #[error("unauthorized")]
    TokenInvalid(#[source] TokenError),

    /// No object backs the requested media key.
    #[error("media not found: {key}")]
    MediaNotFound {
        /// The requested key.
        key: MediaKey,
    },

    /// The object store failed for a reason other than "key absent".
    #[error("storage unavailable")]
    StoreUnavailable(#[source] StoreError),

    /// The album or image name is not a valid media path.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] CoreError),

    /// The startup configuration cannot serve requests.
    #[error(transparent)]
    Config(CoreError),

    /// A session token could not be issued.
    #[error("failed to issue session token")]
    Signing(#[from] SigningError),
}

impl From<TokenError> for GatewayError {
    fn from(err: TokenError) -> Self {
        Self::TokenInvalid(err)
    }
}

impl From<MediaError> for GatewayError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::NotFound { key } => Self::MediaNotFound { key },
            MediaError::StoreUnavailable(err) => Self::StoreUnavailable(err),
            MediaError::InvalidKey(err) => Self::InvalidRequest(err),
        }
    }
}
