//! End-to-end tests for the Photogate gateway.
//!
//! Everything runs in process: the gateway is wired to an
//! [`InMemoryObjectStore`] and a [`StaticCredentialVerifier`], and presigned
//! URLs are followed through the store's `fetch`.
//!
//! ```text
//! cargo test -p photogate-integration
//! ```

use std::sync::{Arc, Once};

use photogate_auth::StaticCredentialVerifier;
use photogate_core::GatewayConfig;
use photogate_gateway::Gateway;
use photogate_store::InMemoryObjectStore;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Demo users: `(id, username, password)`.
pub const USERS: [(u64, &str, &str); 2] = [(1, "pin", "pin-secret"), (2, "pox", "pox-secret")];

/// Signing key shared by gateways that must accept each other's tokens.
pub const SIGNING_KEY: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

/// A gateway and the store behind it.
#[derive(Debug)]
pub struct Fixture {
    /// The gateway under test.
    pub gateway: Gateway,
    /// The backing store, for seeding and fault injection.
    pub store: Arc<InMemoryObjectStore>,
}

/// Seed `store` with two albums:
///
/// - `vacation/1.jpg` (with thumbnail), `vacation/2.jpg` (no thumbnail)
/// - `work/desk.jpg` (with thumbnail)
pub fn seed(store: &InMemoryObjectStore) {
    store.put_object("media", "vacation/1.jpg", b"vacation-1-full".to_vec());
    store.put_object("media", "vacation/2.jpg", b"vacation-2-full".to_vec());
    store.put_object("media", "work/desk.jpg", b"desk-full".to_vec());
    store.put_object("thumbnails", "vacation/1.jpg.jpg", b"vacation-1-thumb".to_vec());
    store.put_object("thumbnails", "work/desk.jpg.jpg", b"desk-thumb".to_vec());
}

/// Verifier knowing the [`USERS`], hashed at the lowest bcrypt cost.
#[must_use]
pub fn verifier() -> StaticCredentialVerifier {
    USERS.iter().fold(
        StaticCredentialVerifier::new().with_cost(4),
        |verifier, (id, name, password)| {
            verifier
                .with_user(*id, name, password)
                .unwrap_or_else(|e| panic!("hashing {name} failed: {e}"))
        },
    )
}

/// Gateway over a seeded in-memory store built from `config`.
#[must_use]
pub fn fixture_with(config: &GatewayConfig) -> Fixture {
    init_tracing();

    let (gateway, store) = Gateway::in_memory(config, Arc::new(verifier()))
        .unwrap_or_else(|e| panic!("gateway construction failed: {e}"));
    seed(&store);
    Fixture { gateway, store }
}

/// Gateway with default configuration, a fixed signing key, and no
/// existence cache.
#[must_use]
pub fn fixture() -> Fixture {
    fixture_with(&test_config())
}

/// Default configuration with a fixed signing key, a test store endpoint,
/// and no existence cache.
#[must_use]
pub fn test_config() -> GatewayConfig {
    GatewayConfig::builder()
        .signing_key(SIGNING_KEY.to_owned())
        .s3_endpoint("http://objects.test:9000".to_owned())
        .s3_access_key("integration".to_owned())
        .s3_secret_key("integration-secret".to_owned())
        .existence_cache_ttl_secs(0)
        .build()
}

#[cfg(test)]
mod test_listing;
#[cfg(test)]
mod test_resolve;
#[cfg(test)]
mod test_session;
