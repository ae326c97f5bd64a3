//! Background worker command.
//!
//! # Usage
//!
//! ```bash
//! mirror-cli work --concurrency 4
//! ```
//!
//! Runs until Ctrl+C or SIGTERM, then waits for in-flight jobs to finish.

use std::sync::Arc;

use catalog_mirror::MirrorConfig;
use catalog_mirror::db::{self, PgProductStore};
use catalog_mirror::jobs::{JobRunner, PgJobQueue, WorkerPool};
use catalog_mirror::services::ProductSyncService;
use catalog_mirror::shopify::ShopifyClient;

use super::CommandError;

/// Run job workers until interrupted.
///
/// # Errors
///
/// Returns error if configuration is invalid or the database is unreachable.
pub async fn run(concurrency: Option<usize>) -> Result<(), CommandError> {
    let config = MirrorConfig::from_env()?;

    let mut worker_config = config.workers;
    if let Some(concurrency) = concurrency {
        worker_config.concurrency = concurrency;
    }
    if worker_config.concurrency == 0 {
        return Err(CommandError::InvalidArgument(
            "concurrency must be at least 1".to_string(),
        ));
    }

    tracing::info!("Connecting to mirror database...");
    let pool = db::create_pool(&config.database_url).await?;

    let sync = ProductSyncService::new(
        Arc::new(PgProductStore::new(pool.clone())),
        Arc::new(PgJobQueue::new(pool)),
    );
    let runner = JobRunner::new(Arc::new(ShopifyClient::new(&config.shopify)?), sync);
    let workers = WorkerPool::spawn(runner, worker_config);

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, waiting for workers...");

    workers.shutdown().await;
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
