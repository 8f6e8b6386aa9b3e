//! Favorites collection and its presence toggle.

use serde::{Deserialize, Serialize};

use crate::models::product::ProductRef;
use crate::types::ProductId;

/// What `Favorites::toggle` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteOutcome {
    Added,
    Removed,
}

/// Favorite products, at most one entry per product id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<ProductRef>", into = "Vec<ProductRef>")]
pub struct Favorites {
    entries: Vec<ProductRef>,
}

impl Favorites {
    /// No favorites.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Entries in the order they were added.
    #[must_use]
    pub fn entries(&self) -> &[ProductRef] {
        &self.entries
    }

    /// Whether a product is a favorite.
    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.entries.iter().any(|p| p.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove the product if present, otherwise append it.
    ///
    /// Calling this twice with the same product restores the original set.
    pub fn toggle(&mut self, product: &ProductRef) -> FavoriteOutcome {
        if self.contains(product.id) {
            self.entries.retain(|p| p.id != product.id);
            FavoriteOutcome::Removed
        } else {
            self.entries.push(product.clone());
            FavoriteOutcome::Added
        }
    }
}

impl From<Vec<ProductRef>> for Favorites {
    fn from(products: Vec<ProductRef>) -> Self {
        let mut favorites = Self::new();
        for product in products {
            if !favorites.contains(product.id) {
                favorites.entries.push(product);
            }
        }
        favorites
    }
}

impl From<Favorites> for Vec<ProductRef> {
    fn from(favorites: Favorites) -> Self {
        favorites.entries
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn product(id: i64) -> ProductRef {
        ProductRef::new(ProductId::new(id), format!("Item {id}"), Decimal::ONE)
    }

    #[test]
    fn test_toggle_adds_then_removes() {
        let mut favorites = Favorites::new();
        assert_eq!(favorites.toggle(&product(1)), FavoriteOutcome::Added);
        assert!(favorites.contains(ProductId::new(1)));
        assert_eq!(favorites.toggle(&product(1)), FavoriteOutcome::Removed);
        assert!(favorites.is_empty());
    }

    #[test]
    fn test_toggle_twice_is_self_inverse() {
        let mut favorites = Favorites::from(vec![product(1), product(2)]);
        let before = favorites.clone();
        favorites.toggle(&product(3));
        favorites.toggle(&product(3));
        assert_eq!(favorites, before);

        favorites.toggle(&product(1));
        favorites.toggle(&product(1));
        assert_eq!(favorites.len(), before.len());
        assert!(favorites.contains(ProductId::new(1)));
    }

    #[test]
    fn test_stored_duplicates_are_dropped() {
        let json = r#"[
            {"id": 1, "name": "A", "price": "1"},
            {"id": 1, "name": "A again", "price": "1"}
        ]"#;
        let favorites: Favorites = serde_json::from_str(json).unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites.entries()[0].name, "A");
    }
}
