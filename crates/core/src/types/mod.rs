//! Core types for Blood Orange.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod envelope;
pub mod id;
pub mod token;
pub mod wishlist;

pub use cart::CartItem;
pub use envelope::ApiEnvelope;
pub use id::*;
pub use token::{StoredTokenPair, TokenPair, TokenPairError};
pub use wishlist::{WishlistData, WishlistEntry, WishlistVariant};
