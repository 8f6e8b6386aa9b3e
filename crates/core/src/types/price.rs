//! Type-safe price representation using decimal arithmetic.
//!
//! Catalog prices, line totals and order totals are all `Decimal`; `Price`
//! pairs an amount with its currency when it has to be shown to someone.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., rupees, not paise).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in the default store currency.
    #[must_use]
    pub fn store(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::default())
    }

    /// The amount rounded half-up to two decimal places.
    #[must_use]
    pub fn rounded(&self) -> Decimal {
        self.amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Format for display (e.g., "₹1234.50").
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self.rounded();
        if rounded.is_sign_negative() {
            format!("-{}{:.2}", self.currency_code.symbol(), rounded.abs())
        } else {
            format!("{}{rounded:.2}", self.currency_code.symbol())
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    INR,
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::INR => "₹",
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// Three-letter ISO code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::INR => "INR",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_rounds_to_cents() {
        let price = Price::store(Decimal::new(123_456, 3)); // 123.456
        assert_eq!(price.display(), "₹123.46");
    }

    #[test]
    fn test_display_pads_whole_amounts() {
        let price = Price::new(Decimal::from(40), CurrencyCode::USD);
        assert_eq!(price.to_string(), "$40.00");
    }

    #[test]
    fn test_display_negative() {
        let price = Price::store(Decimal::new(-2050, 2));
        assert_eq!(price.display(), "-₹20.50");
    }

    #[test]
    fn test_currency_codes() {
        assert_eq!(CurrencyCode::default().code(), "INR");
        assert_eq!(CurrencyCode::GBP.symbol(), "£");
    }
}
