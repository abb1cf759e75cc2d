//! The request-facing gateway.
//!
//! [`Gateway`] is what a transport layer calls for each inbound request:
//! login, session info, logout, album listings, and image resolution. It owns
//! no ambient state; everything is passed in at construction.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use photogate_auth::{
    CredentialError, CredentialVerifier, IssuedToken, SessionTokenService, TokenError,
    TokenServiceConfig,
};
use photogate_core::{GatewayConfig, Identity, MediaKey};
use photogate_media::{Listing, MediaResolver, Resolution, ResolverConfig};
use photogate_store::{InMemoryObjectStore, ObjectStore, PresignerConfig};
use tracing::{debug, error, info, warn};

use crate::error::GatewayError;

/// Identity and lifetime of the session behind a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// Who the session belongs to.
    pub identity: Identity,
    /// When the token was issued.
    pub issued_at: DateTime<Utc>,
    /// When the token expires.
    pub expires_at: DateTime<Utc>,
}

/// Session-authenticated media gateway.
#[derive(Debug)]
pub struct Gateway {
    verifier: Arc<dyn CredentialVerifier>,
    tokens: SessionTokenService,
    resolver: MediaResolver,
}

impl Gateway {
    /// Assemble a gateway from already-built services.
    #[must_use]
    pub fn new(
        verifier: Arc<dyn CredentialVerifier>,
        tokens: SessionTokenService,
        resolver: MediaResolver,
    ) -> Self {
        Self {
            verifier,
            tokens,
            resolver,
        }
    }

    /// Build a gateway from startup configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] if the configuration is invalid, or
    /// [`GatewayError::Signing`] if configured signing key material is
    /// unusable.
    pub fn from_config(
        config: &GatewayConfig,
        verifier: Arc<dyn CredentialVerifier>,
        store: Arc<dyn ObjectStore>,
    ) -> Result<Self, GatewayError> {
        config.validate().map_err(|err| {
            error!(error = %err, "rejecting gateway configuration");
            GatewayError::Config(err)
        })?;
        let tokens = SessionTokenService::from_key_material(
            config.signing_key.as_deref(),
            build_token_config(config),
        )?;
        let resolver = MediaResolver::new(store, build_resolver_config(config));
        info!(
            media_bucket = %config.media_bucket,
            thumbnail_bucket = %config.thumbnail_bucket,
            token_ttl_secs = config.token_ttl_secs,
            presign_ttl_secs = config.presign_ttl_secs,
            "gateway ready"
        );
        Ok(Self::new(verifier, tokens, resolver))
    }

    /// Build a gateway over an empty [`InMemoryObjectStore`] whose URLs use
    /// the configured S3 endpoint, credentials and addressing style.
    ///
    /// The store is returned alongside so it can be seeded.
    ///
    /// # Errors
    ///
    /// Fails as [`Gateway::from_config`] does.
    pub fn in_memory(
        config: &GatewayConfig,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> Result<(Self, Arc<InMemoryObjectStore>), GatewayError> {
        let store = Arc::new(InMemoryObjectStore::new(build_presigner_config(config)));
        let gateway = Self::from_config(config, verifier, Arc::clone(&store) as Arc<dyn ObjectStore>)?;
        Ok((gateway, store))
    }

    /// The session token service.
    #[must_use]
    pub fn tokens(&self) -> &SessionTokenService {
        &self.tokens
    }

    /// The media resolver.
    #[must_use]
    pub fn resolver(&self) -> &MediaResolver {
        &self.resolver
    }

    /// Verify credentials and issue a session token.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::AuthenticationFailure`] for any credential
    /// problem, including an unreachable credential store.
    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedToken, GatewayError> {
        let identity = match self.verifier.verify(username, password).await {
            Ok(identity) => identity,
            Err(CredentialError::InvalidCredentials) => {
                info!(username, "login rejected");
                return Err(GatewayError::AuthenticationFailure);
            }
            Err(err @ (CredentialError::Unavailable(_) | CredentialError::Hashing(_))) => {
                error!(username, error = %err, "credential check failed");
                return Err(GatewayError::AuthenticationFailure);
            }
        };

        let issued = self.tokens.issue(&identity)?;
        info!(user = %identity, expires_at = %issued.expires_at, "login succeeded");
        Ok(issued)
    }

    /// Validate a session token.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::TokenInvalid`] if the token is rejected.
    pub fn authenticate(&self, token: &str) -> Result<Identity, GatewayError> {
        self.tokens
            .validate(token)
            .map_err(|err| Self::token_rejected(err, "validate"))
    }

    /// Identity and lifetime of the session behind `token`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::TokenInvalid`] if the token is rejected.
    pub fn session_info(&self, token: &str) -> Result<SessionInfo, GatewayError> {
        let claims = self
            .tokens
            .decode_at(token, Utc::now())
            .map_err(|err| Self::token_rejected(err, "session"))?;
        let at = |secs| Utc.timestamp_opt(secs, 0).single().unwrap_or_default();
        Ok(SessionInfo {
            identity: claims.identity(),
            issued_at: at(claims.iat),
            expires_at: at(claims.exp),
        })
    }

    /// End a session before it expires.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::TokenInvalid`] if the token is not currently
    /// valid.
    pub fn logout(&self, token: &str) -> Result<Identity, GatewayError> {
        let identity = self
            .tokens
            .revoke(token)
            .map_err(|err| Self::token_rejected(err, "logout"))?;
        info!(user = %identity, "logged out");
        Ok(identity)
    }

    /// List albums.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::TokenInvalid`] if the token is rejected.
    pub async fn list_albums(&self, token: &str) -> Result<Listing, GatewayError> {
        let identity = self.authenticate(token)?;
        let listing = self.resolver.list_albums().await;
        debug!(user = %identity, count = listing.entries.len(), truncated = listing.truncated, "albums listed");
        Ok(listing)
    }

    /// List the images of one album.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::TokenInvalid`] if the token is rejected, or
    /// [`GatewayError::InvalidRequest`] for an invalid album name.
    pub async fn list_album(&self, token: &str, album: &str) -> Result<Listing, GatewayError> {
        let identity = self.authenticate(token)?;
        let listing = self.resolver.list_album(album).await?;
        debug!(user = %identity, album, count = listing.entries.len(), truncated = listing.truncated, "album listed");
        Ok(listing)
    }

    /// Resolve `album/image` to a redirect target.
    ///
    /// `thumbnail` is the raw inbound flag; see [`parse_thumbnail_flag`].
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::TokenInvalid`], [`GatewayError::InvalidRequest`],
    /// [`GatewayError::MediaNotFound`], or [`GatewayError::StoreUnavailable`].
    pub async fn image(
        &self,
        token: &str,
        album: &str,
        image: &str,
        thumbnail: Option<&str>,
    ) -> Result<Resolution, GatewayError> {
        let identity = self.authenticate(token)?;
        let key = MediaKey::from_parts(album, image)?;
        let wants_thumbnail = parse_thumbnail_flag(thumbnail);

        let resolution = self.resolver.resolve(&key, wants_thumbnail).await?;
        debug!(
            user = %identity,
            key = %key,
            variant = %resolution.variant,
            bucket = %resolution.bucket,
            "image resolved"
        );
        Ok(resolution)
    }

    fn token_rejected(err: TokenError, operation: &'static str) -> GatewayError {
        if err == TokenError::Expired {
            debug!(operation, reason = %err, "session token rejected");
        } else {
            warn!(operation, reason = %err, "session token rejected");
        }
        GatewayError::TokenInvalid(err)
    }
}

/// Interpret the inbound `thumbnail` flag.
///
/// `1`, `t`, `T`, `TRUE`, `true`, `True` mean yes. Anything else, including
/// an absent or unparseable flag, means no.
///
/// # Examples
///
/// ```
/// use photogate_gateway::parse_thumbnail_flag;
///
/// assert!(parse_thumbnail_flag(Some("true")));
/// assert!(!parse_thumbnail_flag(Some("yes")));
/// assert!(!parse_thumbnail_flag(None));
/// ```
#[must_use]
pub fn parse_thumbnail_flag(flag: Option<&str>) -> bool {
    matches!(flag, Some("1" | "t" | "T" | "TRUE" | "true" | "True"))
}

/// Token service settings from gateway configuration.
#[must_use]
pub fn build_token_config(config: &GatewayConfig) -> TokenServiceConfig {
    TokenServiceConfig {
        ttl: config.token_ttl(),
    }
}

/// Presigner settings from gateway configuration.
///
/// An `http://` or `https://` scheme on the endpoint overrides `s3_use_ssl`.
#[must_use]
pub fn build_presigner_config(config: &GatewayConfig) -> PresignerConfig {
    let endpoint = config.s3_endpoint.trim();
    let (endpoint, use_ssl) = if let Some(rest) = endpoint.strip_prefix("https://") {
        (rest, true)
    } else if let Some(rest) = endpoint.strip_prefix("http://") {
        (rest, false)
    } else {
        (endpoint, config.s3_use_ssl)
    };

    PresignerConfig {
        endpoint: endpoint.trim_end_matches('/').to_owned(),
        use_ssl,
        access_key: config.s3_access_key.clone(),
        secret_key: config.s3_secret_key.clone(),
        region: config.s3_region.clone(),
        virtual_hosted: config.s3_virtual_hosting,
    }
}

/// Resolver settings from gateway configuration.
#[must_use]
pub fn build_resolver_config(config: &GatewayConfig) -> ResolverConfig {
    ResolverConfig::builder()
        .media_bucket(config.media_bucket.clone())
        .thumbnail_bucket(config.thumbnail_bucket.clone())
        .thumbnail_suffix(config.thumbnail_suffix.clone())
        .presign_ttl(config.presign_ttl())
        .store_timeout(config.store_timeout())
        .strict_originals(config.strict_originals)
        .existence_cache_ttl(config.existence_cache_ttl())
        .existence_cache_capacity(config.existence_cache_capacity)
        .build()
}
