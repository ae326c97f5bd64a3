//! Local product store.
//!
//! ## Tables
//!
//! - `products` - Mirrored Shopify products (variants/images/tags as JSONB)
//! - `sync_jobs` - Background job queue (see [`crate::jobs::PgJobQueue`])
//!
//! # Migrations
//!
//! Migrations are stored in `crates/mirror/migrations/` and run via:
//! ```bash
//! cargo run -p catalog-mirror-cli -- migrate
//! ```

pub mod memory;
pub mod products;

use std::time::Duration;

use async_trait::async_trait;
use catalog_mirror_core::{Product, ProductId, ProductStatus, ShopifyProductData};
use secrecy::ExposeSecret;
use serde::Serialize;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use memory::MemoryProductStore;
pub use products::PgProductStore;

/// Default page size for product listings.
pub const DEFAULT_PAGE_SIZE: u32 = 15;
/// Largest page size a listing may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Result of an upsert keyed by Shopify ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    /// The row as stored after the upsert.
    pub product: Product,
    /// `true` if the row was inserted, `false` if an existing row was overwritten.
    pub created: bool,
}

/// Filters for [`ProductStore::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Case-insensitive substring match on title, vendor or handle.
    pub search: Option<String>,
    pub status: Option<ProductStatus>,
    /// Exact vendor match.
    pub vendor: Option<String>,
}

/// Page-number pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Page size.
    pub first: u32,
    /// 1-based page number.
    pub page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            first: DEFAULT_PAGE_SIZE,
            page: 1,
        }
    }
}

impl Pagination {
    /// Clamp page size to `1..=MAX_PAGE_SIZE` and page to at least 1.
    #[must_use]
    pub fn new(first: u32, page: u32) -> Self {
        Self {
            first: first.clamp(1, MAX_PAGE_SIZE),
            page: page.max(1),
        }
    }

    /// Rows to skip before this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.first)
    }

    /// Last page number for `total` rows (1 when empty).
    #[must_use]
    pub fn last_page(&self, total: u64) -> u64 {
        total.div_ceil(u64::from(self.first.max(1))).max(1)
    }
}

/// One page of a product listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    /// Rows matching the filter across all pages.
    pub total: u64,
    pub current_page: u32,
    pub last_page: u64,
}

/// Storage for mirrored products.
///
/// The synchronization service is the only writer; everything else reads.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Insert or overwrite the row with `data.shopify_id`, atomically.
    async fn upsert(&self, data: ShopifyProductData) -> Result<SyncOutcome, RepositoryError>;

    /// Delete the row with this Shopify ID. Returns whether a row existed.
    async fn delete_by_shopify_id(&self, shopify_id: &str) -> Result<bool, RepositoryError>;

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    async fn find_by_shopify_id(&self, shopify_id: &str)
    -> Result<Option<Product>, RepositoryError>;

    /// Total number of mirrored products.
    async fn count(&self) -> Result<u64, RepositoryError>;

    /// List products ordered by internal id.
    async fn list(
        &self,
        filter: &ProductFilter,
        pagination: Pagination,
    ) -> Result<ProductPage, RepositoryError>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Run the embedded migrations from `crates/mirror/migrations/`.
///
/// # Errors
///
/// Returns `sqlx::migrate::MigrateError` if a migration fails.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
