//! Object store access for Photogate.
//!
//! The media resolver talks to storage only through the [`ObjectStore`]
//! trait: existence checks, presigned GET URLs, and non-recursive listings.
//! This crate also carries the SigV4 presigning used to produce those URLs,
//! and an [`InMemoryObjectStore`] with fault injection for tests.
//!
//! # Modules
//!
//! - [`error`] - Store and presign error types
//! - [`facade`] - The [`ObjectStore`] trait and its value types
//! - [`memory`] - In-memory store
//! - [`presign`] - Presigned URL generation and verification
//! - [`sigv4`] - SigV4 canonicalization and key derivation

pub mod error;
pub mod facade;
pub mod memory;
pub mod presign;
pub mod sigv4;

pub use error::{PresignError, StoreError, StoreErrorKind};
pub use facade::{ObjectInfo, ObjectStore, PresignedUrl};
pub use memory::InMemoryObjectStore;
pub use presign::{MAX_PRESIGN_TTL, MIN_PRESIGN_TTL, Presigner, PresignerConfig};
