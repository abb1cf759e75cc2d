//! Signing key material.
//!
//! A [`SigningKey`] is the symmetric HMAC-SHA256 key used to sign and verify
//! session tokens. One key is used for the whole process lifetime.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose;
use hmac::{Hmac, KeyInit, Mac};
use sha2::Sha256;

use crate::error::SigningError;

/// Minimum accepted key length in bytes.
pub const MIN_KEY_LEN: usize = 32;

type HmacSha256 = Hmac<Sha256>;

/// Symmetric key for session token signatures.
///
/// The `Debug` output never includes the key bytes.
#[derive(Clone)]
pub struct SigningKey {
    bytes: Vec<u8>,
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

impl SigningKey {
    /// Create a key from raw bytes.
    ///
    /// # Errors
    /// Returns [`SigningError::KeyUnavailable`] if fewer than
    /// [`MIN_KEY_LEN`] bytes are supplied.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, SigningError> {
        let bytes = bytes.into();
        if bytes.len() < MIN_KEY_LEN {
            return Err(SigningError::KeyUnavailable(format!(
                "key must be at least {MIN_KEY_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self { bytes })
    }

    /// Parse key material from configuration.
    ///
    /// Accepted encodings, tried in order: hex, base64 (standard or
    /// url-safe, with or without padding), and finally the raw UTF-8 bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use photogate_auth::SigningKey;
    ///
    /// let hex_key = "00".repeat(32);
    /// assert!(SigningKey::parse(&hex_key).is_ok());
    /// assert!(SigningKey::parse("too-short").is_err());
    /// ```
    ///
    /// # Errors
    /// Returns [`SigningError::KeyUnavailable`] if no encoding yields at
    /// least [`MIN_KEY_LEN`] bytes.
    pub fn parse(material: &str) -> Result<Self, SigningError> {
        let trimmed = material.trim();

        if trimmed.len() % 2 == 0 && trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            if let Ok(bytes) = hex::decode(trimmed) {
                if bytes.len() >= MIN_KEY_LEN {
                    return Self::from_bytes(bytes);
                }
            }
        }

        let engines = [
            &general_purpose::STANDARD,
            &general_purpose::STANDARD_NO_PAD,
            &general_purpose::URL_SAFE,
            &general_purpose::URL_SAFE_NO_PAD,
        ];
        for engine in engines {
            if let Ok(bytes) = engine.decode(trimmed) {
                if bytes.len() >= MIN_KEY_LEN {
                    return Self::from_bytes(bytes);
                }
            }
        }

        Self::from_bytes(trimmed.as_bytes())
    }

    /// Generate a random key for this process only.
    ///
    /// Tokens signed with an ephemeral key do not survive a restart.
    #[must_use]
    pub fn ephemeral() -> Self {
        let bytes: [u8; MIN_KEY_LEN] = rand::random();
        Self {
            bytes: bytes.to_vec(),
        }
    }

    /// Compute the HMAC-SHA256 tag of `data`.
    #[must_use]
    pub fn sign(&self, data: &[u8]) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(&self.bytes).expect("HMAC can accept keys of any length");
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    }
}
