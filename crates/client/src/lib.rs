//! Blood Orange API client.
//!
//! # Architecture
//!
//! - REST/JSON backend with a uniform response envelope
//!   (`{ success, data?, message?, error?, errors? }`)
//! - Bearer authentication read fresh from a [`CredentialStore`] on
//!   every request; access-token expiry recovered transparently by a
//!   single-flight refresh (exactly one refresh per expiry event,
//!   concurrent failures queue and replay once)
//! - In-memory caching via `moka` for catalog responses (5 minute TTL);
//!   authenticated reads are never cached
//! - The backend's router is slash-sensitive; every outbound path goes
//!   through one normalization rule (see [`endpoints`])
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use blood_orange_client::{ApiClient, ClientConfig, MemoryCredentialStore};
//!
//! let config = ClientConfig::from_env()?;
//! let credentials = Arc::new(MemoryCredentialStore::new());
//! let client = ApiClient::new(&config, credentials)?;
//!
//! client.login("ada@example.com", "hunter2...").await?;
//! let wishlist = client.fetch_wishlist().await?;
//! let product = client.get_product("citrus-tee").await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

mod cache;
pub mod client;
pub mod config;
pub mod credentials;
pub mod endpoints;
pub mod error;
mod refresh;
pub mod types;

pub use client::{ApiClient, TOKEN_EXPIRED_ERROR};
pub use config::{ClientConfig, ConfigError};
pub use credentials::{
    CredentialStore, CredentialStoreError, FileCredentialStore, MemoryCredentialStore,
};
pub use endpoints::Endpoint;
pub use error::{ApiError, RefreshError};
pub use reqwest::Method;
pub use types::{Customer, Order, OrderList, Product, ProductPage, ProductVariant};
