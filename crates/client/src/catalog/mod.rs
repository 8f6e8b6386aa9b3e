//! Product catalog client.
//!
//! The catalog endpoint returns every product as one JSON array. The list
//! is cached with `moka` and all filtering (category, search, related
//! products) happens client-side over the cached list.
//!
//! # Example
//!
//! ```rust,ignore
//! let catalog = CatalogClient::new(&config.catalog);
//! let fruits = catalog.products_in_category("fruits").await?;
//! let related = catalog.related(&fruits[0], 5).await?;
//! ```

mod cache;

use std::collections::BTreeSet;
use std::sync::Arc;

use moka::future::Cache;
use shopmate_core::{ProductId, ProductRef};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::CatalogConfig;

use cache::{CacheKey, CacheValue};

/// Errors that can occur when reading the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("catalog returned HTTP {0}")]
    Status(u16),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// No product with this id.
    #[error("product not found: {0}")]
    NotFound(ProductId),
}

/// Client for the product catalog endpoint.
///
/// Cheap to clone; clones share the HTTP client and cache.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    endpoint: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("endpoint", &self.inner.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    #[must_use]
    pub fn new(config: &CatalogConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(config.cache_ttl)
            .build();

        Self {
            inner: Arc::new(CatalogClientInner {
                client: reqwest::Client::new(),
                endpoint: config.url.clone(),
                cache,
            }),
        }
    }

    /// Every product in the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not a product
    /// list.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Arc<[ProductRef]>, CatalogError> {
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::AllProducts).await
        {
            debug!("Cache hit for catalog");
            return Ok(products);
        }

        let response = self
            .inner
            .client
            .get(self.inner.endpoint.clone())
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Catalog returned non-success status"
            );
            return Err(CatalogError::Status(status.as_u16()));
        }

        let products: Arc<[ProductRef]> = parse_products(&body)?.into();
        debug!(count = products.len(), "Fetched catalog");

        self.inner
            .cache
            .insert(CacheKey::AllProducts, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Look up one product by id.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the catalog has no such product.
    pub async fn product(&self, id: ProductId) -> Result<ProductRef, CatalogError> {
        self.products()
            .await?
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(CatalogError::NotFound(id))
    }

    /// Products in one category.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be fetched.
    pub async fn products_in_category(
        &self,
        category: &str,
    ) -> Result<Vec<ProductRef>, CatalogError> {
        Ok(filter_category(&self.products().await?, category))
    }

    /// Products whose name, category or brand contains `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be fetched.
    pub async fn search(&self, query: &str) -> Result<Vec<ProductRef>, CatalogError> {
        Ok(search_products(&self.products().await?, query))
    }

    /// Up to `limit` other products from the same category.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be fetched.
    pub async fn related(
        &self,
        product: &ProductRef,
        limit: usize,
    ) -> Result<Vec<ProductRef>, CatalogError> {
        Ok(related_products(&self.products().await?, product, limit))
    }

    /// Distinct category names, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be fetched.
    pub async fn categories(&self) -> Result<Vec<String>, CatalogError> {
        Ok(distinct_categories(&self.products().await?))
    }

    /// Drop the cached product list.
    pub async fn invalidate(&self) {
        self.inner.cache.invalidate(&CacheKey::AllProducts).await;
    }
}

/// Parse the catalog body.
///
/// # Errors
///
/// Returns `CatalogError::Parse` if the body is not a JSON array of products.
pub fn parse_products(body: &str) -> Result<Vec<ProductRef>, CatalogError> {
    Ok(serde_json::from_str(body)?)
}

fn filter_category(products: &[ProductRef], category: &str) -> Vec<ProductRef> {
    products
        .iter()
        .filter(|p| p.category.eq_ignore_ascii_case(category))
        .cloned()
        .collect()
}

fn search_products(products: &[ProductRef], query: &str) -> Vec<ProductRef> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return products.to_vec();
    }
    products
        .iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&needle)
                || p.category.to_lowercase().contains(&needle)
                || p
                    .brand
                    .as_deref()
                    .is_some_and(|b| b.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}

fn related_products(products: &[ProductRef], product: &ProductRef, limit: usize) -> Vec<ProductRef> {
    products
        .iter()
        .filter(|p| p.id != product.id && p.category == product.category)
        .take(limit)
        .cloned()
        .collect()
}

fn distinct_categories(products: &[ProductRef]) -> Vec<String> {
    products
        .iter()
        .filter(|p| !p.category.is_empty())
        .map(|p| p.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
