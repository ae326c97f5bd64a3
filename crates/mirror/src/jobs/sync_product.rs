//! Per-product sync job.

use catalog_mirror_core::ShopifyProductData;
use tracing::{debug, instrument};

use crate::db::SyncOutcome;
use crate::services::ProductSyncService;

use super::JobError;

/// Map a raw product payload and upsert it.
///
/// # Errors
///
/// Returns `JobError::Sync` if the product has no ID or the store fails.
#[instrument(skip_all, fields(shopify_id = tracing::field::Empty))]
pub async fn handle(
    sync: &ProductSyncService,
    payload: &serde_json::Value,
) -> Result<SyncOutcome, JobError> {
    let data = ShopifyProductData::from_api_response(payload);
    tracing::Span::current().record("shopify_id", data.shopify_id.as_str());

    let outcome = sync.sync_product(data).await?;
    debug!(created = outcome.created, "Product job done");
    Ok(outcome)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::db::{MemoryProductStore, ProductStore};
    use crate::jobs::MemoryJobQueue;
    use crate::services::SyncError;

    fn service() -> (ProductSyncService, Arc<MemoryProductStore>) {
        let store = Arc::new(MemoryProductStore::new());
        let sync = ProductSyncService::new(store.clone(), Arc::new(MemoryJobQueue::new()));
        (sync, store)
    }

    #[tokio::test]
    async fn test_payload_is_mapped_and_stored() {
        let (sync, store) = service();

        let outcome = handle(
            &sync,
            &json!({"id": 42, "title": "Widget", "handle": "widget", "tags": "a, b"}),
        )
        .await
        .unwrap();

        assert!(outcome.created);
        let stored = store.find_by_shopify_id("42").await.unwrap().unwrap();
        assert_eq!(stored.tags, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_payload_without_id_fails() {
        let (sync, store) = service();

        let err = handle(&sync, &json!({"title": "No id"})).await.unwrap_err();

        assert!(matches!(err, JobError::Sync(SyncError::MissingExternalId)));
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
