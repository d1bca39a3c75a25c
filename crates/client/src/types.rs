//! Response payload types for the storefront backend.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use blood_orange_core::{CustomerId, ProductId, Sku, VariantId};

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub handle: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Effective price of the default variant.
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Decimal>,
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
}

impl Product {
    /// The variant a bare "add to cart" resolves to: the first available
    /// one, falling back to the first listed.
    #[must_use]
    pub fn default_variant(&self) -> Option<&ProductVariant> {
        self.variants
            .iter()
            .find(|v| v.available)
            .or_else(|| self.variants.first())
    }

    /// Find a variant by id.
    #[must_use]
    pub fn variant(&self, id: &VariantId) -> Option<&ProductVariant> {
        self.variants.iter().find(|v| &v.id == id)
    }
}

/// A purchasable variant of a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductVariant {
    pub id: VariantId,
    pub sku: Sku,
    pub title: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Decimal>,
    #[serde(default = "default_available")]
    pub available: bool,
    /// Option name → selected value (e.g. `"Size" → "M"`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

const fn default_available() -> bool {
    true
}

/// One page of the catalog listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductPage {
    #[serde(default)]
    pub items: Vec<Product>,
    /// Opaque cursor for the next page; `None` on the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// One order in the customer's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    /// Human-facing order number (e.g. `#1001`).
    pub number: String,
    /// ISO-8601 placement timestamp, passed through as the backend
    /// sends it.
    pub placed_at: String,
    pub status: String,
    pub total: Decimal,
}

/// `data` payload of the order-history endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderList {
    #[serde(default)]
    pub items: Vec<Order>,
}

/// The authenticated customer's profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn variant(id: &str, available: bool) -> ProductVariant {
        ProductVariant {
            id: VariantId::new(id),
            sku: Sku::new(format!("SKU-{id}")),
            title: "Default".to_owned(),
            price: "12.00".parse().unwrap(),
            original_price: None,
            available,
            attributes: BTreeMap::new(),
        }
    }

    #[test]
    fn test_default_variant_prefers_available() {
        let product = Product {
            id: ProductId::new("p1"),
            handle: "citrus-tee".to_owned(),
            title: "Citrus Tee".to_owned(),
            description: None,
            image_url: None,
            price: "12.00".parse().unwrap(),
            original_price: None,
            variants: vec![variant("v1", false), variant("v2", true)],
        };

        assert_eq!(product.default_variant().unwrap().id, VariantId::new("v2"));
    }

    #[test]
    fn test_default_variant_falls_back_to_first() {
        let product = Product {
            id: ProductId::new("p1"),
            handle: "citrus-tee".to_owned(),
            title: "Citrus Tee".to_owned(),
            description: None,
            image_url: None,
            price: "12.00".parse().unwrap(),
            original_price: None,
            variants: vec![variant("v1", false), variant("v2", false)],
        };

        assert_eq!(product.default_variant().unwrap().id, VariantId::new("v1"));
    }

    #[test]
    fn test_variant_availability_defaults_to_true() {
        let parsed: ProductVariant = serde_json::from_str(
            r#"{"id":"v1","sku":"S1","title":"Default","price":"10.00"}"#,
        )
        .unwrap();
        assert!(parsed.available);
    }
}
