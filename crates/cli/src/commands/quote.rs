//! Price a cart file.
//!
//! # Usage
//!
//! ```bash
//! shopmate quote --items cart.json --tier express --promo WELCOME20
//! ```
//!
//! The file holds the same array of `{ "product": {...}, "quantity": n }`
//! lines that is stored under `users/{uid}/cart`.

use std::path::Path;

use shopmate_core::{Cart, DeliveryTier, PricingPolicy, PromoCode};
use tracing::info;

/// Read a cart from `path`, price it and print the totals as JSON.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not a cart, or the promo
/// code is unknown.
pub async fn quote(
    path: &Path,
    pricing: &PricingPolicy,
    tier: DeliveryTier,
    promo: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = tokio::fs::read_to_string(path).await?;
    let cart: Cart = serde_json::from_str(&content)?;

    let promo = promo
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(PromoCode::parse)
        .transpose()?;

    pricing.validate()?;
    let totals = pricing.totals(&cart, tier, promo);

    info!(
        path = %path.display(),
        lines = cart.len(),
        tier = tier.label(),
        "Priced cart"
    );

    #[allow(clippy::print_stdout)]
    {
        println!("{}", serde_json::to_string_pretty(&totals)?);
    }

    Ok(())
}
