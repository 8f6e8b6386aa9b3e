//! Cache types for catalog responses.

use std::sync::Arc;

use shopmate_core::ProductRef;

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    /// The full product list.
    AllProducts,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(Arc<[ProductRef]>),
}
