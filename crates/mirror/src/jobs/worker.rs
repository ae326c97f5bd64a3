//! Polling worker pool.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::WorkerConfig;

use super::JobRunner;

/// A set of workers draining the runner's queue.
///
/// Each worker claims one job at a time. An idle worker sleeps for the poll
/// interval, waking early on shutdown.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    shutdown: watch::Sender<bool>,
}

impl WorkerPool {
    /// Start `config.concurrency` workers. Zero workers is a valid, idle pool.
    #[must_use]
    pub fn spawn(runner: JobRunner, config: WorkerConfig) -> Self {
        let (shutdown, signal) = watch::channel(false);

        let handles = (0..config.concurrency)
            .map(|worker| {
                tokio::spawn(work(
                    worker,
                    runner.clone(),
                    config.poll_interval,
                    signal.clone(),
                ))
            })
            .collect();

        info!(
            workers = config.concurrency,
            poll_interval = ?config.poll_interval,
            "Job workers started"
        );

        Self { handles, shutdown }
    }

    /// Number of running workers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Signal every worker to stop and wait for in-flight jobs to finish.
    pub async fn shutdown(self) {
        // Receivers may already be gone if every worker exited.
        let _ = self.shutdown.send(true);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Job worker panicked");
            }
        }
        info!("Job workers stopped");
    }
}

async fn work(
    worker: usize,
    runner: JobRunner,
    poll_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    debug!(worker, "Job worker running");

    while !*shutdown.borrow() {
        let idle = match runner.process_next().await {
            Ok(processed) => !processed,
            Err(e) => {
                error!(worker, error = %e, "Failed to claim job");
                true
            }
        };

        if idle {
            tokio::select! {
                () = tokio::time::sleep(poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
    }

    debug!(worker, "Job worker exiting");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::{Value, json};

    use super::*;
    use crate::db::{MemoryProductStore, ProductStore};
    use crate::jobs::{Job, JobQueue, MemoryJobQueue};
    use crate::services::ProductSyncService;
    use crate::shopify::{CatalogSource, ProductsPage, ShopifyError};

    struct NoCatalog;

    #[async_trait]
    impl CatalogSource for NoCatalog {
        async fn fetch_page(&self, _: Option<&str>) -> Result<ProductsPage, ShopifyError> {
            Ok(ProductsPage::default())
        }

        async fn fetch_product(&self, _: &str) -> Result<Option<Value>, ShopifyError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_workers_drain_queue_then_stop() {
        let store = Arc::new(MemoryProductStore::new());
        let queue = Arc::new(MemoryJobQueue::new());
        for id in 1..=5 {
            queue
                .enqueue(Job::SyncProduct {
                    payload: json!({"id": id, "title": format!("Product {id}")}),
                })
                .await
                .unwrap();
        }

        let sync = ProductSyncService::new(store.clone(), queue.clone());
        let pool = WorkerPool::spawn(
            JobRunner::new(Arc::new(NoCatalog), sync),
            WorkerConfig {
                concurrency: 2,
                poll_interval: Duration::from_millis(10),
            },
        );
        assert_eq!(pool.len(), 2);

        for _ in 0..100 {
            if store.count().await.unwrap() == 5 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        pool.shutdown().await;
        assert_eq!(store.count().await.unwrap(), 5);
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn test_zero_workers_shutdown_immediately() {
        let queue = Arc::new(MemoryJobQueue::new());
        let sync = ProductSyncService::new(Arc::new(MemoryProductStore::new()), queue);
        let pool = WorkerPool::spawn(
            JobRunner::new(Arc::new(NoCatalog), sync),
            WorkerConfig {
                concurrency: 0,
                poll_interval: Duration::from_secs(60),
            },
        );

        assert!(pool.is_empty());
        pool.shutdown().await;
    }
}
