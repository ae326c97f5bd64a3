//! CLI command implementations.

pub mod migrate;
pub mod products;
pub mod sync;
pub mod work;

use catalog_mirror::config::ConfigError;
use catalog_mirror::db::RepositoryError;
use catalog_mirror::jobs::QueueError;
use catalog_mirror::services::SyncError;
use catalog_mirror::shopify::ShopifyError;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Shopify error: {0}")]
    Shopify(#[from] ShopifyError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Connect to the mirror database named by `MIRROR_DATABASE_URL`.
async fn connect() -> Result<sqlx::PgPool, CommandError> {
    let database_url = catalog_mirror::MirrorConfig::database_url_from_env()?;

    tracing::info!("Connecting to mirror database...");
    Ok(catalog_mirror::db::create_pool(&database_url).await?)
}
