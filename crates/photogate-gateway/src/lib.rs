//! Session-authenticated media gateway.
//!
//! Composes the session token service, a credential verifier, and the media
//! resolver behind the operations a transport layer exposes:
//!
//! - `login(username, password)` issues a session token
//! - `session_info(token)` / `logout(token)`
//! - `list_albums(token)` / `list_album(token, album)`
//! - `image(token, album, image, thumbnail)` returns a presigned redirect target
//!
//! Every failure is a [`GatewayError`].

pub mod error;
pub mod gateway;
pub mod telemetry;

pub use error::GatewayError;
pub use gateway::{
    Gateway, SessionInfo, build_presigner_config, build_resolver_config, build_token_config,
    parse_thumbnail_flag,
};
pub use telemetry::init_tracing;
