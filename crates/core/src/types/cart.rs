//! Cart line item.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{ProductId, Sku, VariantId};

/// A single line item in the cart.
///
/// The `sku` is the unique key: the cart store guarantees no two items
/// share one. `unit_price` is the effective (discounted) price actually
/// charged; `original_price` is the pre-discount price kept for display
/// only and never used in totals. `quantity` is always at least 1 for a
/// stored item; an item whose quantity would drop to zero is removed
/// instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub sku: Sku,
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub title: String,
    pub unit_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub quantity: u32,
    /// Selected variant attributes (e.g. size, color), keyed by option name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl CartItem {
    /// Line total: effective unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}
