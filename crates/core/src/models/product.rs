//! Product snapshots copied from the catalog.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// An immutable product snapshot.
///
/// Deserializes straight from the catalog endpoint (prices may arrive as
/// JSON strings or numbers) and is copied as-is into carts, favorites and
/// orders. Unknown catalog fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRef {
    /// Catalog product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Unit price in the store currency.
    pub price: Decimal,
    /// Category slug (e.g., "fruits").
    #[serde(default)]
    pub category: String,
    /// Product image URL.
    #[serde(default)]
    pub image_url: String,
    /// Long description.
    #[serde(default)]
    pub description: String,
    /// Brand name, when the catalog has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// Sales unit (e.g., "kg", "pack").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Advertised discount percentage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<Decimal>,
    /// Average rating.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    /// Whether the catalog lists the product as available.
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
}

const fn default_in_stock() -> bool {
    true
}

impl ProductRef {
    /// Create a minimal product snapshot.
    #[must_use]
    pub fn new(id: ProductId, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            category: String::new(),
            image_url: String::new(),
            description: String::new(),
            brand: None,
            unit: None,
            discount: None,
            rating: None,
            in_stock: true,
        }
    }

    /// Set the category slug.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Unit price with currency, for display.
    #[must_use]
    pub fn display_price(&self) -> Price {
        Price::store(self.price)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_catalog_shape_with_string_price() {
        let json = r#"{
            "id": 7,
            "name": "Alphonso Mango",
            "price": "249.50",
            "category": "fruits",
            "imageUrl": "https://cdn.example.com/mango.png",
            "description": "Sweet",
            "brand": "Ratnagiri",
            "inStock": true,
            "quantity": 40,
            "unit": "kg",
            "discount": 10,
            "rating": 4.6
        }"#;

        let product: ProductRef = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, ProductId::new(7));
        assert_eq!(product.price, Decimal::new(24950, 2));
        assert_eq!(product.unit.as_deref(), Some("kg"));
        assert_eq!(product.discount, Some(Decimal::from(10)));
    }

    #[test]
    fn test_deserialize_numeric_price_and_defaults() {
        let product: ProductRef =
            serde_json::from_str(r#"{"id": 1, "name": "Milk", "price": 100}"#).unwrap();
        assert_eq!(product.price, Decimal::from(100));
        assert!(product.in_stock);
        assert!(product.category.is_empty());
    }

    #[test]
    fn test_display_price() {
        let product = ProductRef::new(ProductId::new(1), "Milk", Decimal::new(5, 1));
        assert_eq!(product.display_price().display(), "₹0.50");
    }
}
