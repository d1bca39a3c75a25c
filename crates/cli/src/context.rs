//! The CLI's composition root.
//!
//! Everything is constructed exactly once here and threaded into the
//! command handlers: the API client over a file-backed credential
//! store, and the two state containers over file-backed storage, both
//! hydrated before any command runs.

use std::path::PathBuf;
use std::sync::Arc;

use blood_orange_client::{ApiClient, ClientConfig, FileCredentialStore};
use blood_orange_stores::{CartStore, FileStorage, Storage, WishlistReconciler, WishlistStore};

const DEFAULT_STATE_DIR: &str = ".blood-orange";

/// Shared dependencies for command handlers.
pub struct AppContext {
    pub client: ApiClient,
    pub cart: CartStore,
    pub wishlist: WishlistReconciler,
}

impl AppContext {
    /// Build the composition root from the environment and hydrate the
    /// state containers.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is missing/invalid or the
    /// state directory is unusable.
    pub async fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let config = ClientConfig::from_env()?;

        let state_dir = std::env::var("BLOOD_ORANGE_STATE_DIR")
            .map_or_else(|_| PathBuf::from(DEFAULT_STATE_DIR), PathBuf::from);

        let credentials = Arc::new(FileCredentialStore::open(
            state_dir.join("credentials.json"),
        )?);
        let client = ApiClient::new(&config, credentials)?;
        client.on_session_invalidated(|| {
            tracing::warn!("Session expired; run `bo-cli login` to sign in again");
        });

        let storage = Arc::new(FileStorage::open(&state_dir)?) as Arc<dyn Storage>;
        let cart = CartStore::new(Arc::clone(&storage));
        let wishlist_store = WishlistStore::new(storage);

        // Commands read immediately after this, so hydration happens up
        // front rather than lazily.
        cart.hydrate().await;
        wishlist_store.hydrate().await;

        Ok(Self {
            cart,
            wishlist: WishlistReconciler::new(wishlist_store, client.clone()),
            client,
        })
    }

    /// Wait for outstanding fire-and-forget persistence before exit.
    pub async fn settle(&self) {
        self.cart.persist_settled().await;
        self.wishlist.store().persist_settled().await;
    }
}
