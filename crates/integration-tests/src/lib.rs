//! Integration tests for Blood Orange.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p blood-orange-integration-tests
//! ```
//!
//! Every test spins up its own `httpmock` server standing in for the
//! storefront backend; nothing here needs a network or a real API.
//!
//! # Test Categories
//!
//! - `refresh_coordination` - single-flight token refresh under
//!   concurrency
//! - `wishlist_sync` - server-wins reconciliation and optimistic
//!   toggles
//! - `cart_persistence` - cart scenario flows, hydration gating, and
//!   durable round-trips

use std::sync::Arc;

use blood_orange_client::{ApiClient, ClientConfig, CredentialStore, MemoryCredentialStore};
use blood_orange_core::TokenPair;

/// Build a client against a mock server's base URL, optionally seeded
/// with a credential pair.
///
/// # Panics
///
/// Panics on invalid test fixtures; tests only.
#[must_use]
pub fn client_for(base_url: &str, pair: Option<(&str, &str)>) -> ApiClient {
    let config = ClientConfig::new(base_url).expect("mock server URL is valid");

    let credentials: Arc<dyn CredentialStore> = match pair {
        Some((access, refresh)) => Arc::new(MemoryCredentialStore::with_pair(
            TokenPair::new(access, refresh).expect("test tokens are non-empty"),
        )),
        None => Arc::new(MemoryCredentialStore::new()),
    };

    ApiClient::new(&config, credentials).expect("client builds against mock server")
}
