//! Stateless session tokens and credential verification for Photogate.
//!
//! A session token is a self-contained, HMAC-SHA256-signed credential that
//! encodes an [`Identity`](photogate_core::Identity), its issue time, and its
//! expiry. Validation is a pure function of the token, the signing key, and
//! the wall clock, plus an optional denylist of revoked token ids.
//!
//! # Token format
//!
//! ```text
//! v1.<base64url(claims json)>.<base64url(HMAC-SHA256(key, "v1.<claims>"))>
//! ```
//!
//! # Modules
//!
//! - [`credentials`] - Credential verifier contract and a static development verifier
//! - [`error`] - Token, signing, and credential error types
//! - [`key`] - Signing key material
//! - [`revocation`] - Optional denylist for ending sessions early
//! - [`token`] - Token issuance and validation

pub mod credentials;
pub mod error;
pub mod key;
pub mod revocation;
pub mod token;

pub use credentials::{CredentialVerifier, DEFAULT_PASSWORD_COST, StaticCredentialVerifier};
pub use error::{CredentialError, SigningError, TokenError};
pub use key::SigningKey;
pub use revocation::RevocationList;
pub use token::{Claims, IssuedToken, SessionTokenService, TokenServiceConfig};
