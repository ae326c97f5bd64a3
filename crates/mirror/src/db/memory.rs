//! In-memory product store.
//!
//! Behaves like [`super::PgProductStore`] (same upsert key, same filters and
//! ordering) without a database. Used by tests and local dry runs.

use async_trait::async_trait;
use catalog_mirror_core::{Product, ProductId, ShopifyProductData};
use chrono::Utc;
use tokio::sync::RwLock;

use super::{Pagination, ProductFilter, ProductPage, ProductStore, RepositoryError, SyncOutcome};

#[derive(Debug, Default)]
struct Inner {
    /// Rows in insertion (and therefore id) order.
    rows: Vec<Product>,
    next_id: i32,
}

/// Product store held in process memory.
#[derive(Debug, Default)]
pub struct MemoryProductStore {
    inner: RwLock<Inner>,
}

impl MemoryProductStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all rows.
    pub async fn all(&self) -> Vec<Product> {
        self.inner.read().await.rows.clone()
    }
}

fn matches_filter(product: &Product, filter: &ProductFilter) -> bool {
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let needle = search.to_lowercase();
        let hit = product.title.to_lowercase().contains(&needle)
            || product.handle.to_lowercase().contains(&needle)
            || product
                .vendor
                .as_deref()
                .is_some_and(|v| v.to_lowercase().contains(&needle));
        if !hit {
            return false;
        }
    }

    if filter.status.is_some_and(|status| product.status != status) {
        return false;
    }

    if let Some(vendor) = &filter.vendor {
        if product.vendor.as_ref() != Some(vendor) {
            return false;
        }
    }

    true
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn upsert(&self, data: ShopifyProductData) -> Result<SyncOutcome, RepositoryError> {
        let now = Utc::now();
        let mut inner = self.inner.write().await;

        if let Some(existing) = inner
            .rows
            .iter_mut()
            .find(|p| p.shopify_id == data.shopify_id)
        {
            existing.apply(data, now);
            return Ok(SyncOutcome {
                product: existing.clone(),
                created: false,
            });
        }

        inner.next_id += 1;
        let product = Product::from_data(ProductId::new(inner.next_id), data, now);
        inner.rows.push(product.clone());

        Ok(SyncOutcome {
            product,
            created: true,
        })
    }

    async fn delete_by_shopify_id(&self, shopify_id: &str) -> Result<bool, RepositoryError> {
        let mut inner = self.inner.write().await;
        let before = inner.rows.len();
        inner.rows.retain(|p| p.shopify_id != shopify_id);
        Ok(inner.rows.len() < before)
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner.rows.iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_shopify_id(
        &self,
        shopify_id: &str,
    ) -> Result<Option<Product>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner
            .rows
            .iter()
            .find(|p| p.shopify_id == shopify_id)
            .cloned())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.inner.read().await.rows.len() as u64)
    }

    async fn list(
        &self,
        filter: &ProductFilter,
        pagination: Pagination,
    ) -> Result<ProductPage, RepositoryError> {
        let inner = self.inner.read().await;
        let matching: Vec<&Product> = inner
            .rows
            .iter()
            .filter(|p| matches_filter(p, filter))
            .collect();

        let total = matching.len() as u64;
        let skip = usize::try_from(pagination.offset()).unwrap_or(usize::MAX);
        let products = matching
            .into_iter()
            .skip(skip)
            .take(pagination.first as usize)
            .cloned()
            .collect();

        Ok(ProductPage {
            products,
            total,
            current_page: pagination.page,
            last_page: pagination.last_page(total),
        })
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
