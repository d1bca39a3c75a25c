//! Blood Orange Core - Shared types library.
//!
//! This crate provides common types used across all Blood Orange components:
//! - `client` - Authenticated API client for the storefront backend
//! - `stores` - Persisted cart and wishlist state containers
//! - `cli` - Command-line composition root
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no
//! storage access. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, credential pair, cart item, and the
//!   backend's JSON response envelope

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
