//! Cache types for catalog API responses.

use crate::types::{Product, ProductPage};

/// Cached value types. Only catalog reads are cached; anything
/// personalized bypasses the cache entirely.
#[derive(Debug, Clone)]
pub(crate) enum CachedCatalog {
    Product(Box<Product>),
    Products(ProductPage),
}
