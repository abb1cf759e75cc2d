//! Session token issuance and validation.
//!
//! [`SessionTokenService`] issues signed tokens for identities that a
//! [`CredentialVerifier`](crate::CredentialVerifier) has already accepted,
//! and validates tokens presented on later requests:
//!
//! 1. Split the token into version, claims, and signature parts
//!    ([`TokenError::Malformed`] if the structure is wrong).
//! 2. Recompute the HMAC over `version.claims` and compare it to the
//!    presented signature in constant time ([`TokenError::SignatureInvalid`]).
//! 3. Decode the claims and require `now < exp` ([`TokenError::Expired`]).
//! 4. Consult the revocation denylist, only if it has entries
//!    ([`TokenError::Revoked`]).
//!
//! A token's lifetime is one-directional: issued, valid, then expired.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use photogate_core::{Identity, UserId};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use crate::error::{SigningError, TokenError};
use crate::key::SigningKey;
use crate::revocation::RevocationList;

/// Version tag prefixed to every token.
const TOKEN_VERSION: &str = "v1";

/// Default session lifetime.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

/// Token service settings.
#[derive(Debug, Clone)]
pub struct TokenServiceConfig {
    /// Lifetime of issued tokens.
    pub ttl: Duration,
}

impl Default for TokenServiceConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TOKEN_TTL,
        }
    }
}

/// The signed payload of a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: u64,
    /// Display name.
    pub name: String,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expires at (unix seconds).
    pub exp: i64,
    /// Unique token id, used for revocation.
    pub jti: String,
}

impl Claims {
    /// The identity carried by these claims.
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity::new(UserId(self.sub), self.name.clone())
    }
}

/// A freshly issued token and its metadata.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The opaque token string handed to the client.
    pub token: String,
    /// Who the token was issued to.
    pub identity: Identity,
    /// Unique token id.
    pub token_id: String,
    /// When the token was issued.
    pub issued_at: DateTime<Utc>,
    /// When the token stops being valid.
    pub expires_at: DateTime<Utc>,
}

/// Issues and validates stateless session tokens.
///
/// Safe to share across tasks: the key and TTL are immutable and the
/// revocation denylist is a concurrent map.
///
/// # Examples
///
/// ```
/// use photogate_auth::{SessionTokenService, SigningKey, TokenServiceConfig};
/// use photogate_core::{Identity, UserId};
///
/// let service = SessionTokenService::new(SigningKey::ephemeral(), TokenServiceConfig::default());
/// let identity = Identity::new(UserId(1), "pin");
/// let issued = service.issue(&identity).unwrap();
/// assert_eq!(service.validate(&issued.token).unwrap(), identity);
/// ```
#[derive(Debug)]
pub struct SessionTokenService {
    key: SigningKey,
    ttl: Duration,
    revoked: RevocationList,
}

impl SessionTokenService {
    /// Create a service with the given key and settings.
    #[must_use]
    pub fn new(key: SigningKey, config: TokenServiceConfig) -> Self {
        Self {
            key,
            ttl: config.ttl,
            revoked: RevocationList::new(),
        }
    }

    /// Create a service from optional configured key material.
    ///
    /// Without key material a random per-process key is generated.
    ///
    /// # Errors
    /// Returns [`SigningError::KeyUnavailable`] if material is supplied but
    /// cannot be used as a key.
    pub fn from_key_material(
        material: Option<&str>,
        config: TokenServiceConfig,
    ) -> Result<Self, SigningError> {
        let key = if let Some(material) = material {
            SigningKey::parse(material)?
        } else {
            warn!("no signing key configured, sessions will not survive a restart");
            SigningKey::ephemeral()
        };
        Ok(Self::new(key, config))
    }

    /// Lifetime of issued tokens.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for an already-verified identity.
    ///
    /// # Errors
    /// Returns a [`SigningError`] if the token cannot be produced.
    pub fn issue(&self, identity: &Identity) -> Result<IssuedToken, SigningError> {
        self.issue_at(identity, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    ///
    /// # Errors
    /// Returns a [`SigningError`] if the token cannot be produced.
    pub fn issue_at(
        &self,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, SigningError> {
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|_| SigningError::LifetimeOutOfRange)?;
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or(SigningError::LifetimeOutOfRange)?;

        let claims = Claims {
            sub: identity.id.0,
            name: identity.display_name.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: uuid::Uuid::new_v4().simple().to_string(),
        };

        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let signing_input = format!("{TOKEN_VERSION}.{payload}");
        let signature = URL_SAFE_NO_PAD.encode(self.key.sign(signing_input.as_bytes()));

        debug!(user_id = %identity.id, token_id = %claims.jti, exp = claims.exp, "session token issued");

        Ok(IssuedToken {
            token: format!("{signing_input}.{signature}"),
            identity: identity.clone(),
            token_id: claims.jti,
            issued_at: now,
            expires_at,
        })
    }

    /// Validate a presented token and return the identity it carries.
    ///
    /// # Errors
    /// Returns the [`TokenError`] describing why the token was rejected.
    pub fn validate(&self, token: &str) -> Result<Identity, TokenError> {
        self.validate_at(token, Utc::now())
    }

    /// Validate a token as if the current time were `now`.
    ///
    /// # Errors
    /// Returns the [`TokenError`] describing why the token was rejected.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, TokenError> {
        self.decode_at(token, now).map(|claims| claims.identity())
    }

    /// Validate a token and return its full claims.
    ///
    /// # Errors
    /// Returns the [`TokenError`] describing why the token was rejected.
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let mut parts = token.split('.');
        let (Some(version), Some(payload), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Malformed);
        };
        if version != TOKEN_VERSION {
            return Err(TokenError::Malformed);
        }

        let payload_bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Malformed)?;
        let provided = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Malformed)?;

        let signing_input = &token[..version.len() + 1 + payload.len()];
        let expected = self.key.sign(signing_input.as_bytes());
        if !bool::from(provided.as_slice().ct_eq(expected.as_slice())) {
            return Err(TokenError::SignatureInvalid);
        }

        let claims: Claims =
            serde_json::from_slice(&payload_bytes).map_err(|_| TokenError::Malformed)?;

        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        if !self.revoked.is_empty() && self.revoked.is_revoked(&claims.jti, now) {
            return Err(TokenError::Revoked);
        }

        Ok(claims)
    }

    /// End a session before its natural expiry.
    ///
    /// The token must currently be valid; revoking twice reports
    /// [`TokenError::Revoked`].
    ///
    /// # Errors
    /// Returns the [`TokenError`] if the token is not currently valid.
    pub fn revoke(&self, token: &str) -> Result<Identity, TokenError> {
        self.revoke_at(token, Utc::now())
    }

    /// Revoke a token as if the current time were `now`.
    ///
    /// # Errors
    /// Returns the [`TokenError`] if the token is not currently valid.
    pub fn revoke_at(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, TokenError> {
        let claims = self.decode_at(token, now)?;
        self.revoked.revoke(&claims.jti, claims.exp, now);
        Ok(claims.identity())
    }
}
