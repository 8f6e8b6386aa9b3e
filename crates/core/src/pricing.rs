//! Cart totals: discount, delivery fee and tax.
//!
//! Two tables have historically been used: the cart summary charged 5% tax
//! and a flat 50 delivery fee, while checkout charged 18% on the discounted
//! subtotal with a per-tier fee. Both are available as presets of one
//! `PricingPolicy`; which one applies is a deployment decision.
//!
//! ```
//! use rust_decimal::Decimal;
//! use shopmate_core::{Cart, CartLine, DeliveryTier, PricingPolicy, ProductId, ProductRef};
//!
//! let milk = ProductRef::new(ProductId::new(1), "Milk", Decimal::from(100));
//! let cart = Cart::from_lines(CartLine::with_quantity(milk, 2));
//!
//! let totals = PricingPolicy::checkout().totals(&cart, DeliveryTier::Express, None);
//! assert_eq!(totals.subtotal, Decimal::from(200));
//! assert_eq!(totals.tax, Decimal::from(36));
//! assert_eq!(totals.grand_total, Decimal::from(336));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::cart::Cart;
use crate::types::DeliveryTier;

/// Errors from pricing inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    /// The promo code is not recognised.
    #[error("unknown promo code: {0}")]
    UnknownPromoCode(String),
    /// Tax rate outside `0..=1`.
    #[error("tax rate must be between 0 and 1 (got {0})")]
    InvalidTaxRate(Decimal),
    /// Negative delivery fee.
    #[error("delivery fee for {0} cannot be negative")]
    NegativeFee(DeliveryTier),
}

/// Promo codes accepted at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PromoCode {
    /// 20% off the subtotal.
    Welcome20,
}

impl PromoCode {
    /// Parse a code as typed by the shopper (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `PricingError::UnknownPromoCode` for anything unrecognised.
    pub fn parse(code: &str) -> Result<Self, PricingError> {
        match code.trim().to_ascii_uppercase().as_str() {
            "WELCOME20" => Ok(Self::Welcome20),
            _ => Err(PricingError::UnknownPromoCode(code.to_owned())),
        }
    }

    /// Fraction of the subtotal taken off.
    #[must_use]
    pub fn discount_rate(self) -> Decimal {
        match self {
            Self::Welcome20 => Decimal::new(20, 2),
        }
    }

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Welcome20 => "WELCOME20",
        }
    }
}

/// Delivery fee per tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryFees {
    pub standard: Decimal,
    pub express: Decimal,
    pub same_day: Decimal,
}

impl DeliveryFees {
    /// The same fee for every tier.
    #[must_use]
    pub const fn flat(fee: Decimal) -> Self {
        Self {
            standard: fee,
            express: fee,
            same_day: fee,
        }
    }

    #[must_use]
    pub const fn fee(&self, tier: DeliveryTier) -> Decimal {
        match tier {
            DeliveryTier::Standard => self.standard,
            DeliveryTier::Express => self.express,
            DeliveryTier::SameDay => self.same_day,
        }
    }
}

/// Tax rate and delivery fee table used to price a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// Fraction applied to the discounted subtotal (0.18 = 18%).
    pub tax_rate: Decimal,
    pub delivery_fees: DeliveryFees,
}

impl PricingPolicy {
    /// 18% GST, standard 40 / express 100 / same-day 150.
    #[must_use]
    pub fn checkout() -> Self {
        Self {
            tax_rate: Decimal::new(18, 2),
            delivery_fees: DeliveryFees {
                standard: Decimal::from(40),
                express: Decimal::from(100),
                same_day: Decimal::from(150),
            },
        }
    }

    /// 5% tax, flat 50 delivery.
    #[must_use]
    pub fn cart_summary() -> Self {
        Self {
            tax_rate: Decimal::new(5, 2),
            delivery_fees: DeliveryFees::flat(Decimal::from(50)),
        }
    }

    /// Check that the policy is usable.
    ///
    /// # Errors
    ///
    /// Returns `PricingError` if the tax rate is outside `0..=1` or a fee is
    /// negative.
    pub fn validate(&self) -> Result<(), PricingError> {
        if self.tax_rate.is_sign_negative() || self.tax_rate > Decimal::ONE {
            return Err(PricingError::InvalidTaxRate(self.tax_rate));
        }
        for tier in [
            DeliveryTier::Standard,
            DeliveryTier::Express,
            DeliveryTier::SameDay,
        ] {
            if self.delivery_fees.fee(tier).is_sign_negative() {
                return Err(PricingError::NegativeFee(tier));
            }
        }
        Ok(())
    }

    /// Price a cart.
    ///
    /// `grand_total = subtotal - discount + delivery_fee + tax`, with tax
    /// charged on `subtotal - discount`. Amounts are exact; round only for
    /// display.
    #[must_use]
    pub fn totals(&self, cart: &Cart, tier: DeliveryTier, promo: Option<PromoCode>) -> CartTotals {
        let subtotal = cart.subtotal();
        let discount = promo.map_or(Decimal::ZERO, |p| subtotal * p.discount_rate());
        let delivery_fee = self.delivery_fees.fee(tier);
        let tax = (subtotal - discount) * self.tax_rate;

        CartTotals {
            item_count: cart.item_count(),
            subtotal,
            discount,
            delivery_fee,
            tax,
            grand_total: subtotal - discount + delivery_fee + tax,
        }
    }
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self::checkout()
    }
}

/// The derived numbers shown in an order summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CartTotals {
    pub item_count: u32,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub delivery_fee: Decimal,
    pub tax: Decimal,
    pub grand_total: Decimal,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::{CartLine, ProductRef};
    use crate::types::ProductId;

    fn cart(lines: &[(i64, i64, u32)]) -> Cart {
        Cart::from_lines(lines.iter().map(|&(id, price, qty)| {
            CartLine::with_quantity(
                ProductRef::new(ProductId::new(id), "p", Decimal::from(price)),
                qty,
            )
            .unwrap()
        }))
    }

    #[test]
    fn test_subtotal_example() {
        let totals = PricingPolicy::checkout().totals(
            &cart(&[(1, 10, 2), (2, 5, 3)]),
            DeliveryTier::Standard,
            None,
        );
        assert_eq!(totals.subtotal, Decimal::from(35));
        assert_eq!(totals.item_count, 5);
    }

    #[test]
    fn test_checkout_with_promo_taxes_discounted_subtotal() {
        let totals = PricingPolicy::checkout().totals(
            &cart(&[(1, 1000, 1)]),
            DeliveryTier::SameDay,
            Some(PromoCode::Welcome20),
        );
        assert_eq!(totals.discount, Decimal::from(200));
        assert_eq!(totals.tax, Decimal::from(144));
        assert_eq!(totals.delivery_fee, Decimal::from(150));
        assert_eq!(totals.grand_total, Decimal::from(1094));
    }

    #[test]
    fn test_cart_summary_preset() {
        let policy = PricingPolicy::cart_summary();
        let totals = policy.totals(&cart(&[(1, 200, 1)]), DeliveryTier::Express, None);
        assert_eq!(totals.tax, Decimal::from(10));
        assert_eq!(totals.delivery_fee, Decimal::from(50));
        assert_eq!(totals.grand_total, Decimal::from(260));
    }

    #[test]
    fn test_empty_cart_still_charges_delivery() {
        let totals = PricingPolicy::checkout().totals(&Cart::new(), DeliveryTier::Standard, None);
        assert_eq!(totals.subtotal, Decimal::ZERO);
        assert_eq!(totals.grand_total, Decimal::from(40));
    }

    #[test]
    fn test_promo_code_parse() {
        assert_eq!(PromoCode::parse(" welcome20 ").unwrap(), PromoCode::Welcome20);
        assert!(matches!(
            PromoCode::parse("FREESHIP"),
            Err(PricingError::UnknownPromoCode(_))
        ));
    }

    #[test]
    fn test_validate() {
        assert!(PricingPolicy::checkout().validate().is_ok());
        let mut policy = PricingPolicy::checkout();
        policy.tax_rate = Decimal::from(2);
        assert!(matches!(policy.validate(), Err(PricingError::InvalidTaxRate(_))));
        let mut policy = PricingPolicy::cart_summary();
        policy.delivery_fees.express = Decimal::from(-1);
        assert_eq!(
            policy.validate(),
            Err(PricingError::NegativeFee(DeliveryTier::Express))
        );
    }
}
