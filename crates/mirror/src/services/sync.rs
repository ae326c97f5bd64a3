//! Product synchronization service.
//!
//! Every write to the local product store goes through here:
//! - webhook deliveries (create/update via a queued job, delete inline)
//! - per-product sync jobs from a full sync
//! - the operator's single-product sync

use std::sync::Arc;

use catalog_mirror_core::ShopifyProductData;
use thiserror::Error;
use tracing::{info, instrument};

use crate::db::{ProductStore, RepositoryError, SyncOutcome};
use crate::jobs::{Job, JobQueue, QueueError};
use crate::shopify::{CatalogSource, ShopifyError};

/// Errors from product synchronization.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("store error: {0}")]
    Store(#[from] RepositoryError),

    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("catalog error: {0}")]
    Catalog(#[from] ShopifyError),

    /// The product record has no Shopify ID to key the upsert on.
    #[error("product has no Shopify ID")]
    MissingExternalId,
}

/// Writes Shopify products into the local store.
#[derive(Clone)]
pub struct ProductSyncService {
    store: Arc<dyn ProductStore>,
    queue: Arc<dyn JobQueue>,
}

impl ProductSyncService {
    /// Create a new sync service.
    #[must_use]
    pub fn new(store: Arc<dyn ProductStore>, queue: Arc<dyn JobQueue>) -> Self {
        Self { store, queue }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn ProductStore> {
        &self.store
    }

    #[must_use]
    pub fn queue(&self) -> &Arc<dyn JobQueue> {
        &self.queue
    }

    /// Insert or overwrite the product keyed by its Shopify ID.
    ///
    /// The write is atomic. Repeating it with the same data leaves one row.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::MissingExternalId` for an empty Shopify ID, or
    /// `SyncError::Store` if the upsert fails.
    #[instrument(skip(self, data), fields(shopify_id = %data.shopify_id))]
    pub async fn sync_product(&self, data: ShopifyProductData) -> Result<SyncOutcome, SyncError> {
        if data.shopify_id.trim().is_empty() {
            return Err(SyncError::MissingExternalId);
        }

        let outcome = self.store.upsert(data).await?;

        info!(
            product_id = %outcome.product.id,
            created = outcome.created,
            "Synced product"
        );
        Ok(outcome)
    }

    /// Delete the product with this Shopify ID. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Store` if the delete fails.
    #[instrument(skip(self))]
    pub async fn delete_by_shopify_id(&self, shopify_id: &str) -> Result<bool, SyncError> {
        let deleted = self.store.delete_by_shopify_id(shopify_id).await?;
        info!(deleted, "Deleted product");
        Ok(deleted)
    }

    /// Start a full sync by queueing the first page fetch.
    ///
    /// Returns once the job is queued; the sync itself runs on the workers.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Queue` if the job cannot be queued.
    #[instrument(skip(self))]
    pub async fn dispatch_full_sync(&self) -> Result<(), SyncError> {
        self.queue
            .enqueue(Job::FetchProductsPage { page_info: None })
            .await?;
        info!("Full product sync dispatched");
        Ok(())
    }

    /// Fetch one product from the catalog and upsert it now.
    ///
    /// Returns `Ok(None)` when the catalog has no such product.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Catalog` if the fetch fails, or any error from
    /// [`Self::sync_product`].
    #[instrument(skip(self, source))]
    pub async fn sync_single(
        &self,
        source: &dyn CatalogSource,
        shopify_id: &str,
    ) -> Result<Option<SyncOutcome>, SyncError> {
        let Some(raw) = source.fetch_product(shopify_id).await? else {
            info!("Product not found in catalog");
            return Ok(None);
        };

        let data = ShopifyProductData::from_api_response(&raw);
        self.sync_product(data).await.map(Some)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use async_trait::async_trait;
    use serde_json::{Value, json};

    use super::*;
    use crate::db::MemoryProductStore;
    use crate::jobs::MemoryJobQueue;
    use crate::shopify::ProductsPage;

    struct SingleProduct(Option<Value>);

    #[async_trait]
    impl CatalogSource for SingleProduct {
        async fn fetch_page(&self, _: Option<&str>) -> Result<ProductsPage, ShopifyError> {
            Ok(ProductsPage::default())
        }

        async fn fetch_product(&self, _: &str) -> Result<Option<Value>, ShopifyError> {
            Ok(self.0.clone())
        }
    }

    fn service() -> (ProductSyncService, Arc<MemoryProductStore>, Arc<MemoryJobQueue>) {
        let store = Arc::new(MemoryProductStore::new());
        let queue = Arc::new(MemoryJobQueue::new());
        (
            ProductSyncService::new(store.clone(), queue.clone()),
            store,
            queue,
        )
    }

    fn data(id: &str, title: &str) -> ShopifyProductData {
        ShopifyProductData::from_api_response(&json!({"id": id, "title": title, "handle": "h"}))
    }

    #[tokio::test]
    async fn test_sync_is_idempotent() {
        let (sync, store, _) = service();

        let first = sync.sync_product(data("1", "Widget")).await.unwrap();
        let second = sync.sync_product(data("1", "Widget")).await.unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.product.id, second.product.id);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_empty_shopify_id_is_rejected() {
        let (sync, store, _) = service();

        let err = sync.sync_product(data("", "Orphan")).await.unwrap_err();

        assert!(matches!(err, SyncError::MissingExternalId));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_reports_existence() {
        let (sync, _, _) = service();
        sync.sync_product(data("1", "Widget")).await.unwrap();

        assert!(sync.delete_by_shopify_id("1").await.unwrap());
        assert!(!sync.delete_by_shopify_id("1").await.unwrap());
    }

    #[tokio::test]
    async fn test_dispatch_full_sync_queues_first_page() {
        let (sync, store, queue) = service();

        sync.dispatch_full_sync().await.unwrap();

        assert_eq!(queue.jobs().await, vec![Job::FetchProductsPage { page_info: None }]);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sync_single() {
        let (sync, store, _) = service();

        let found = SingleProduct(Some(json!({"id": 55, "title": "Found"})));
        let outcome = sync.sync_single(&found, "55").await.unwrap().unwrap();
        assert_eq!(outcome.product.shopify_id, "55");

        let missing = SingleProduct(None);
        assert!(sync.sync_single(&missing, "56").await.unwrap().is_none());
        assert_eq!(store.count().await.unwrap(), 1);
    }
}
