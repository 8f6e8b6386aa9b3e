//! Catalog browsing.
//!
//! # Usage
//!
//! ```bash
//! shopmate catalog
//! shopmate catalog --category fruits --limit 5
//! shopmate catalog --search apple
//! shopmate catalog --categories
//! shopmate catalog --related 3
//! ```
//!
//! # Environment Variables
//!
//! - `SHOPMATE_CATALOG_URL` - Catalog endpoint (defaults to the public demo
//!   backend)

use shopmate_client::catalog::{CatalogClient, CatalogError};
use shopmate_client::config::ClientConfig;
use shopmate_core::ProductId;
use tracing::info;

/// Which slice of the catalog to list.
pub enum Filter {
    All,
    Category(String),
    Search(String),
    /// Same-category products for a product id.
    Related(i64),
    Categories,
}

/// Print products (or category names) from the catalog.
///
/// # Errors
///
/// Returns an error if the catalog cannot be fetched or parsed.
pub async fn list(config: &ClientConfig, filter: Filter, limit: usize) -> Result<(), CatalogError> {
    let catalog = CatalogClient::new(&config.catalog);

    let products = match filter {
        Filter::Categories => {
            let categories = catalog.categories().await?;
            info!(count = categories.len(), "Fetched categories");
            #[allow(clippy::print_stdout)]
            {
                for category in categories {
                    println!("{category}");
                }
            }
            return Ok(());
        }
        Filter::All => catalog.products().await?.to_vec(),
        Filter::Category(category) => catalog.products_in_category(&category).await?,
        Filter::Search(query) => catalog.search(&query).await?,
        Filter::Related(id) => {
            let product = catalog.product(ProductId::new(id)).await?;
            info!(product = %product.name, "Finding related products");
            catalog.related(&product, limit).await?
        }
    };

    info!(matched = products.len(), shown = products.len().min(limit), "Fetched products");

    #[allow(clippy::print_stdout)]
    {
        for product in products.iter().take(limit) {
            let stock = if product.in_stock { "" } else { "  (out of stock)" };
            println!(
                "{:>6}  {:<40}  {:>12}  {}{stock}",
                product.id.to_string(),
                product.name,
                product.display_price().to_string(),
                product.category,
            );
        }
    }

    Ok(())
}
