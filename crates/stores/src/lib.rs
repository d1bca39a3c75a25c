//! Blood Orange persisted state containers.
//!
//! The cart and wishlist live client-side: explicit state-container
//! objects constructed once at the composition root, mutated
//! synchronously in memory, persisted asynchronously (fire-and-forget)
//! to a durable key-value [`Storage`], and rehydrated on startup.
//!
//! Each container tracks a hydration flag so consumers can tell "empty
//! because not yet loaded" from "empty because truly empty": gate any
//! is-it-really-empty decision on [`CartStore::has_hydrated`] /
//! [`WishlistStore::has_hydrated`].
//!
//! The wishlist is additionally reconciled against server truth by
//! [`WishlistReconciler`]: a plain async function the application calls
//! on identity change, not a framework lifecycle hook.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
mod persist;
pub mod storage;
pub mod sync;
pub mod wishlist;

pub use cart::{CART_STORAGE_KEY, CartStore};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
pub use sync::WishlistReconciler;
pub use wishlist::{WISHLIST_STORAGE_KEY, WishlistStore};
