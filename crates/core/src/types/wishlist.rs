//! Wishlist wire payload shapes.
//!
//! The wishlist list endpoint returns
//! `{ data: { items: [{ default_variant: { id, ... }, ... }] } }`;
//! clients extract `default_variant.id` from each entry to build the
//! local membership set.

use serde::{Deserialize, Serialize};

use super::id::VariantId;

/// `data` payload of the wishlist list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WishlistData {
    #[serde(default)]
    pub items: Vec<WishlistEntry>,
}

/// One wishlist entry; only the default variant matters to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WishlistEntry {
    pub default_variant: WishlistVariant,
}

/// Variant reference inside a wishlist entry. The backend sends more
/// fields; everything beyond the id is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WishlistVariant {
    pub id: VariantId,
}

impl WishlistData {
    /// Extract the variant ids in server order.
    #[must_use]
    pub fn variant_ids(self) -> Vec<VariantId> {
        self.items
            .into_iter()
            .map(|entry| entry.default_variant.id)
            .collect()
    }
}
