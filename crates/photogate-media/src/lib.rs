//! Media resolution engine for Photogate.
//!
//! Turns a logical [`MediaKey`](photogate_core::MediaKey) into a presigned
//! URL for its thumbnail or original, and lists album contents. All storage
//! access goes through [`ObjectStore`](photogate_store::ObjectStore).
//!
//! # Modules
//!
//! - [`cache`] - Bounded TTL cache of existence checks
//! - [`error`] - [`MediaError`]
//! - [`resolver`] - [`MediaResolver`], variant selection and listing

pub mod cache;
pub mod error;
pub mod resolver;

pub use cache::ExistenceCache;
pub use error::MediaError;
pub use resolver::{Listing, MediaResolver, Resolution, ResolverConfig, Variant};
