//! Credential verifier trait and implementations.
//!
//! This module defines the [`CredentialVerifier`] contract the gateway uses to
//! turn a username and password into an [`Identity`], along with a
//! [`StaticCredentialVerifier`] for tests and development.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use photogate_core::{Identity, UserId};

use crate::error::CredentialError;

/// Looks up users and checks their passwords.
///
/// Implementations may back this with a database, a directory service, or
/// a static table. Unknown users and wrong passwords must both be reported
/// as [`CredentialError::InvalidCredentials`].
#[async_trait]
pub trait CredentialVerifier: Send + Sync + fmt::Debug {
    /// Verify `password` for `username` and return the user's identity.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::InvalidCredentials`] on any mismatch, or
    /// [`CredentialError::Unavailable`] if the backing store cannot be reached.
    async fn verify(&self, username: &str, password: &str) -> Result<Identity, CredentialError>;
}

struct UserRecord {
    id: UserId,
    hash: String,
}

/// bcrypt work factor used unless overridden.
pub const DEFAULT_PASSWORD_COST: u32 = bcrypt::DEFAULT_COST;

/// An in-memory verifier holding bcrypt password hashes.
///
/// Plaintext passwords are never retained. Hash checks run on the blocking
/// thread pool. Unknown users are checked against a dummy hash of the same
/// cost so they take as long as a wrong password.
///
/// # Examples
///
/// ```
/// use photogate_auth::StaticCredentialVerifier;
///
/// let verifier = StaticCredentialVerifier::new()
///     .with_cost(4)
///     .with_user(1, "pin", "hunter2")
///     .unwrap();
/// assert_eq!(verifier.len(), 1);
/// ```
pub struct StaticCredentialVerifier {
    users: HashMap<String, UserRecord>,
    cost: u32,
    dummy_hash: Option<String>,
}

impl Default for StaticCredentialVerifier {
    fn default() -> Self {
        Self {
            users: HashMap::new(),
            cost: DEFAULT_PASSWORD_COST,
            dummy_hash: None,
        }
    }
}

impl fmt::Debug for StaticCredentialVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredentialVerifier")
            .field("users", &self.users.len())
            .finish()
    }
}

impl StaticCredentialVerifier {
    /// Create an empty verifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bcrypt cost for users added afterwards.
    #[must_use]
    pub fn with_cost(mut self, cost: u32) -> Self {
        self.cost = cost;
        self.dummy_hash = None;
        self
    }

    /// Add a user, replacing any existing user with the same name.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Hashing`] if the password cannot be hashed
    /// (for example, an unsupported cost).
    pub fn with_user(
        mut self,
        id: u64,
        username: &str,
        password: &str,
    ) -> Result<Self, CredentialError> {
        let hash = bcrypt::hash(password, self.cost)
            .map_err(|e| CredentialError::Hashing(e.to_string()))?;
        if self.dummy_hash.is_none() {
            let dummy = bcrypt::hash(hex::encode(rand::random::<[u8; 16]>()), self.cost)
                .map_err(|e| CredentialError::Hashing(e.to_string()))?;
            self.dummy_hash = Some(dummy);
        }
        self.users.insert(
            username.to_owned(),
            UserRecord {
                id: UserId(id),
                hash,
            },
        );
        Ok(self)
    }

    /// Number of registered users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether no users are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl CredentialVerifier for StaticCredentialVerifier {
    async fn verify(&self, username: &str, password: &str) -> Result<Identity, CredentialError> {
        let (id, hash) = match (self.users.get(username), &self.dummy_hash) {
            (Some(record), _) => (Some(record.id), record.hash.clone()),
            (None, Some(dummy)) => (None, dummy.clone()),
            (None, None) => return Err(CredentialError::InvalidCredentials),
        };

        let password = password.to_owned();
        let matched = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| CredentialError::Unavailable(e.to_string()))?
            .map_err(|e| CredentialError::Hashing(e.to_string()))?;

        match id {
            Some(id) if matched => Ok(Identity::new(id, username)),
            _ => Err(CredentialError::InvalidCredentials),
        }
    }
}
