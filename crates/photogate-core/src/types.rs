//! Identity and media key types shared across services.

use std::fmt;

use crate::error::CoreError;

/// Separator between media key segments.
const SEGMENT_SEPARATOR: char = '/';

/// Opaque numeric user reference issued by the credential store.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An authenticated user: numeric id plus display name.
///
/// Produced by a credential verifier or decoded from a valid session token.
/// Never persisted by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Identity {
    /// The user reference.
    pub id: UserId,
    /// Human-readable name (the login username).
    pub display_name: String,
}

impl Identity {
    /// Create a new identity.
    #[must_use]
    pub fn new(id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.display_name, self.id)
    }
}

/// Logical path of one media asset, e.g. `vacation/1.jpg`.
///
/// The first segment is the album; the remainder names the image. Keys are
/// otherwise opaque: no uniqueness is enforced beyond what the object store
/// provides.
///
/// # Examples
///
/// ```
/// use photogate_core::MediaKey;
///
/// let key = MediaKey::from_parts("vacation", "1.jpg").unwrap();
/// assert_eq!(key.as_str(), "vacation/1.jpg");
/// assert_eq!(key.album(), "vacation");
/// assert_eq!(key.image(), Some("1.jpg"));
/// assert_eq!(key.with_suffix(".jpg"), "vacation/1.jpg.jpg");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(transparent)]
pub struct MediaKey(String);

impl MediaKey {
    /// Create a media key from a logical path.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidMediaKey`] if the path is empty or has an
    /// empty segment (leading, trailing, or doubled `/`).
    pub fn new(key: impl Into<String>) -> Result<Self, CoreError> {
        let key = key.into();
        if key.is_empty() {
            return Err(CoreError::InvalidMediaKey {
                key,
                reason: "key is empty",
            });
        }
        if key.split(SEGMENT_SEPARATOR).any(str::is_empty) {
            return Err(CoreError::InvalidMediaKey {
                key,
                reason: "key contains an empty segment",
            });
        }
        Ok(Self(key))
    }

    /// Create a media key from an album and an image segment.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidMediaKey`] if either part is empty.
    pub fn from_parts(album: &str, image: &str) -> Result<Self, CoreError> {
        Self::new(format!("{album}{SEGMENT_SEPARATOR}{image}"))
    }

    /// The album segment (first segment of the path).
    #[must_use]
    pub fn album(&self) -> &str {
        self.0
            .split_once(SEGMENT_SEPARATOR)
            .map_or(self.0.as_str(), |(album, _)| album)
    }

    /// The image part (everything after the album), if any.
    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.0.split_once(SEGMENT_SEPARATOR).map(|(_, image)| image)
    }

    /// The key with `suffix` appended, as used for thumbnail objects.
    #[must_use]
    pub fn with_suffix(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.0)
    }

    /// The full logical path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MediaKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for MediaKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
