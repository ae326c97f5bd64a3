//! Catalog sync commands.
//!
//! # Usage
//!
//! ```bash
//! # Queue a full sync for the workers
//! mirror-cli sync
//!
//! # Queue a full sync and process it in this process
//! mirror-cli sync --drain
//!
//! # Fetch and upsert one product now (exits 1 if Shopify has no such product)
//! mirror-cli sync --product-id 632910392
//! ```
//!
//! # Environment Variables
//!
//! - `MIRROR_DATABASE_URL` - `PostgreSQL` connection string
//! - `SHOPIFY_STORE_DOMAIN`, `SHOPIFY_ACCESS_TOKEN`, `SHOPIFY_API_VERSION`

use std::sync::Arc;

use catalog_mirror::MirrorConfig;
use catalog_mirror::db::{self, PgProductStore};
use catalog_mirror::jobs::{JobRunner, PgJobQueue};
use catalog_mirror::services::ProductSyncService;
use catalog_mirror::shopify::ShopifyClient;

use super::CommandError;

async fn service(config: &MirrorConfig) -> Result<ProductSyncService, CommandError> {
    tracing::info!("Connecting to mirror database...");
    let pool = db::create_pool(&config.database_url).await?;

    Ok(ProductSyncService::new(
        Arc::new(PgProductStore::new(pool.clone())),
        Arc::new(PgJobQueue::new(pool)),
    ))
}

/// Queue a full sync, optionally draining the queue in-process.
///
/// # Errors
///
/// Returns error if configuration is invalid or the job cannot be queued.
pub async fn full(drain: bool) -> Result<(), CommandError> {
    let config = MirrorConfig::from_env()?;
    let sync = service(&config).await?;

    sync.dispatch_full_sync().await?;
    tracing::info!("Full product sync dispatched");

    if drain {
        let runner = JobRunner::new(Arc::new(ShopifyClient::new(&config.shopify)?), sync);
        tracing::info!("Processing queued jobs...");
        let processed = runner.drain().await?;
        tracing::info!(processed, "Queue drained");
    }

    Ok(())
}

/// Fetch one product from Shopify and upsert it.
///
/// # Errors
///
/// Returns `CommandError::NotFound` if Shopify has no product with this ID,
/// or any fetch/store error.
pub async fn single(shopify_id: &str) -> Result<(), CommandError> {
    let config = MirrorConfig::from_env()?;
    let sync = service(&config).await?;
    let client = ShopifyClient::new(&config.shopify)?;

    let outcome = sync
        .sync_single(&client, shopify_id)
        .await?
        .ok_or_else(|| CommandError::NotFound(format!("product {shopify_id} in Shopify")))?;

    tracing::info!(
        "{} product {} ({})",
        if outcome.created { "Created" } else { "Updated" },
        outcome.product.shopify_id,
        outcome.product.title
    );
    Ok(())
}
