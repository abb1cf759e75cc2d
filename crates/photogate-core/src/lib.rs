//! Core types, identities, and configuration for Photogate.
//!
//! This crate provides the building blocks shared by the session token
//! service, the media resolution engine, and the gateway facade: the
//! [`Identity`] produced by authentication, the logical [`MediaKey`] that
//! names one asset independently of which bucket backs it, and the
//! environment-driven [`GatewayConfig`].

mod config;
mod error;
mod types;

pub use config::{GatewayConfig, MAX_PRESIGN_TTL_SECS};
pub use error::{CoreError, CoreResult};
pub use types::{Identity, MediaKey, UserId};
