//! Cart lines and the cart reducer.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::product::ProductRef;
use crate::types::ProductId;

/// Errors from cart transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The product has no line in the cart.
    #[error("product {0} is not in the cart")]
    ItemNotFound(ProductId),
}

/// A product in the cart with its quantity.
///
/// The quantity is always at least 1: a line that would drop to zero is
/// removed from the cart instead. Stored lines with quantity 0 are rejected
/// on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredCartLine")]
pub struct CartLine {
    /// Snapshot of the product when it was added.
    pub product: ProductRef,
    quantity: u32,
}

impl CartLine {
    /// A new line holding a single unit.
    #[must_use]
    pub const fn new(product: ProductRef) -> Self {
        Self {
            product,
            quantity: 1,
        }
    }

    /// A line with an explicit quantity, or `None` for zero.
    #[must_use]
    pub fn with_quantity(product: ProductRef, quantity: u32) -> Option<Self> {
        if quantity == 0 {
            None
        } else {
            Some(Self { product, quantity })
        }
    }

    /// Number of units on this line.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Product ID of this line.
    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product.id
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity)
    }
}

#[derive(Deserialize)]
struct StoredCartLine {
    product: ProductRef,
    quantity: u32,
}

impl TryFrom<StoredCartLine> for CartLine {
    type Error = String;

    fn try_from(stored: StoredCartLine) -> Result<Self, Self::Error> {
        let id = stored.product.id;
        Self::with_quantity(stored.product, stored.quantity)
            .ok_or_else(|| format!("cart line for product {id} has zero quantity"))
    }
}

/// What a cart transition did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartChange {
    /// A new line was inserted with quantity 1.
    Added,
    /// An existing line now has this quantity.
    QuantityChanged(u32),
    /// The line was dropped from the cart.
    Removed,
}

/// The cart collection: at most one line per product id.
///
/// Serializes as a plain array of lines; duplicate lines in stored data are
/// merged on the way in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<CartLine>", into = "Vec<CartLine>")]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Build a cart from lines, merging duplicates by product id.
    #[must_use]
    pub fn from_lines(lines: impl IntoIterator<Item = CartLine>) -> Self {
        let mut cart = Self::new();
        for line in lines {
            match cart.position(line.product_id()) {
                Some(i) => {
                    if let Some(existing) = cart.lines.get_mut(i) {
                        existing.quantity = existing.quantity.saturating_add(line.quantity);
                    }
                }
                None => cart.lines.push(line),
            }
        }
        cart
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Consume the cart and return its lines.
    #[must_use]
    pub fn into_lines(self) -> Vec<CartLine> {
        self.lines
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// The line for a product, if present.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product_id() == id)
    }

    fn position(&self, id: ProductId) -> Option<usize> {
        self.lines.iter().position(|line| line.product_id() == id)
    }

    /// Add one unit of `product`, inserting a new line if needed.
    pub fn increase(&mut self, product: &ProductRef) -> CartChange {
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id() == product.id) {
            line.quantity = line.quantity.saturating_add(1);
            CartChange::QuantityChanged(line.quantity)
        } else {
            self.lines.push(CartLine::new(product.clone()));
            CartChange::Added
        }
    }

    /// Remove one unit of a product; a line at quantity 1 is removed.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ItemNotFound` if the product has no line; the cart
    /// is left untouched.
    pub fn decrease(&mut self, id: ProductId) -> Result<CartChange, CartError> {
        let index = self.position(id).ok_or(CartError::ItemNotFound(id))?;
        let quantity = self.lines.get(index).map_or(0, CartLine::quantity);

        if quantity <= 1 {
            self.lines.remove(index);
            Ok(CartChange::Removed)
        } else {
            let remaining = quantity - 1;
            if let Some(line) = self.lines.get_mut(index) {
                line.quantity = remaining;
            }
            Ok(CartChange::QuantityChanged(remaining))
        }
    }

    /// Drop a product's line, or every line when `id` is `None`.
    ///
    /// Passing `None` clears the whole cart; this is how checkout empties it.
    /// Removing an id that is not present is a no-op.
    pub fn remove(&mut self, id: Option<ProductId>) {
        match id {
            Some(id) => self.lines.retain(|line| line.product_id() != id),
            None => self.lines.clear(),
        }
    }

    /// Sum of price times quantity over all lines.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .map(CartLine::quantity)
            .fold(0, u32::saturating_add)
    }
}

impl From<Vec<CartLine>> for Cart {
    fn from(lines: Vec<CartLine>) -> Self {
        Self::from_lines(lines)
    }
}

impl From<Cart> for Vec<CartLine> {
    fn from(cart: Cart) -> Self {
        cart.lines
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: i64, price: i64) -> ProductRef {
        ProductRef::new(ProductId::new(id), format!("Product {id}"), Decimal::from(price))
    }

    fn quantities(cart: &Cart) -> Vec<(i64, u32)> {
        cart.lines()
            .iter()
            .map(|l| (l.product_id().as_i64(), l.quantity()))
            .collect()
    }

    #[test]
    fn test_increase_new_product_adds_single_unit() {
        let mut cart = Cart::new();
        assert_eq!(cart.increase(&product(1, 100)), CartChange::Added);
        assert_eq!(quantities(&cart), vec![(1, 1)]);
    }

    #[test]
    fn test_increase_existing_product_bumps_quantity() {
        let mut cart = Cart::new();
        cart.increase(&product(1, 100));
        assert_eq!(cart.increase(&product(1, 100)), CartChange::QuantityChanged(2));
        assert_eq!(quantities(&cart), vec![(1, 2)]);
    }

    #[test]
    fn test_increase_decrease_scenario() {
        let p = product(1, 100);
        let mut cart = Cart::new();

        cart.increase(&p);
        assert_eq!(quantities(&cart), vec![(1, 1)]);
        cart.increase(&p);
        assert_eq!(quantities(&cart), vec![(1, 2)]);
        assert_eq!(cart.decrease(p.id).unwrap(), CartChange::QuantityChanged(1));
        assert_eq!(quantities(&cart), vec![(1, 1)]);
        assert_eq!(cart.decrease(p.id).unwrap(), CartChange::Removed);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_decrease_missing_product_is_error_without_mutation() {
        let mut cart = Cart::new();
        cart.increase(&product(1, 100));
        let before = cart.clone();

        assert_eq!(
            cart.decrease(ProductId::new(9)),
            Err(CartError::ItemNotFound(ProductId::new(9)))
        );
        assert_eq!(cart, before);
    }

    #[test]
    fn test_remove_with_id_filters_one_line() {
        let mut cart = Cart::new();
        cart.increase(&product(1, 10));
        cart.increase(&product(2, 20));
        cart.remove(Some(ProductId::new(1)));
        assert_eq!(quantities(&cart), vec![(2, 1)]);
    }

    #[test]
    fn test_remove_without_id_clears_everything() {
        let mut cart = Cart::new();
        cart.increase(&product(1, 10));
        cart.increase(&product(2, 20));
        cart.increase(&product(2, 20));
        cart.remove(None);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_subtotal_and_item_count() {
        let cart = Cart::from_lines([
            CartLine::with_quantity(product(1, 10), 2).unwrap(),
            CartLine::with_quantity(product(2, 5), 3).unwrap(),
        ]);
        assert_eq!(cart.subtotal(), Decimal::from(35));
        assert_eq!(cart.item_count(), 5);
    }

    #[test]
    fn test_from_lines_merges_duplicates() {
        let cart = Cart::from_lines([
            CartLine::new(product(1, 10)),
            CartLine::with_quantity(product(1, 10), 2).unwrap(),
        ]);
        assert_eq!(quantities(&cart), vec![(1, 3)]);
    }

    #[test]
    fn test_zero_quantity_line_is_unrepresentable() {
        assert!(CartLine::with_quantity(product(1, 10), 0).is_none());
    }

    #[test]
    fn test_stored_zero_quantity_is_rejected() {
        let json = r#"[{"product": {"id": 1, "name": "Milk", "price": "10"}, "quantity": 0}]"#;
        assert!(serde_json::from_str::<Cart>(json).is_err());
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let mut cart = Cart::new();
        cart.increase(&product(3, 10));
        let json = serde_json::to_value(&cart).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["quantity"], 1);
        assert_eq!(json[0]["product"]["id"], 3);
    }
}
