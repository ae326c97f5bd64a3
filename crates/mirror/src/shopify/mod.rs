//! Shopify Admin REST API access.
//!
//! # Architecture
//!
//! - [`CatalogSource`] is the seam the sync jobs depend on
//! - [`ShopifyClient`] implements it over `reqwest`
//! - Pagination follows the `Link` header cursor (`page_info`)
//!
//! # Example
//!
//! ```rust,ignore
//! use catalog_mirror::shopify::{CatalogSource, ShopifyClient};
//!
//! let client = ShopifyClient::new(&config.shopify)?;
//!
//! let first = client.fetch_page(None).await?;
//! if let Some(token) = first.next_page_info.as_deref() {
//!     let second = client.fetch_page(Some(token)).await?;
//! }
//!
//! let product = client.fetch_product("632910392").await?;
//! ```

mod client;
pub mod pagination;

pub use client::{PAGE_SIZE, ShopifyClient};

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when talking to the Shopify Admin API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Shopify answered with a non-success status.
    #[error("Shopify returned {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One page of raw product payloads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductsPage {
    /// Raw product objects, unmapped.
    pub products: Vec<serde_json::Value>,
    /// Cursor for the next page, if any.
    pub next_page_info: Option<String>,
}

/// Read access to the remote product catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch one page of products. `None` requests the first page.
    async fn fetch_page(&self, page_info: Option<&str>) -> Result<ProductsPage, ShopifyError>;

    /// Fetch a single product. Returns `Ok(None)` when Shopify has no such product.
    async fn fetch_product(
        &self,
        shopify_id: &str,
    ) -> Result<Option<serde_json::Value>, ShopifyError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shopify_error_display() {
        let err = ShopifyError::Status {
            status: reqwest::StatusCode::TOO_MANY_REQUESTS,
            url: "https://test.myshopify.com/admin/api/2024-01/products.json".to_string(),
        };

        assert_eq!(
            err.to_string(),
            "Shopify returned 429 Too Many Requests for https://test.myshopify.com/admin/api/2024-01/products.json"
        );
    }
}
