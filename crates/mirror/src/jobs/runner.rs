//! Job dispatch.

use std::sync::Arc;

use tracing::{error, info, instrument};

use crate::services::ProductSyncService;
use crate::shopify::CatalogSource;

use super::{ClaimedJob, Job, JobError, JobQueue, QueueError, fetch_products, sync_product};

/// Runs jobs against the catalog, the sync service and the queue they came from.
#[derive(Clone)]
pub struct JobRunner {
    source: Arc<dyn CatalogSource>,
    sync: ProductSyncService,
}

impl JobRunner {
    #[must_use]
    pub fn new(source: Arc<dyn CatalogSource>, sync: ProductSyncService) -> Self {
        Self { source, sync }
    }

    /// Queue that follow-up jobs are enqueued on.
    #[must_use]
    pub fn queue(&self) -> &Arc<dyn JobQueue> {
        self.sync.queue()
    }

    /// Run one job to completion.
    ///
    /// # Errors
    ///
    /// Returns the handler's error. Nothing is retried.
    pub async fn run(&self, job: &Job) -> Result<(), JobError> {
        match job {
            Job::FetchProductsPage { page_info } => {
                fetch_products::handle(
                    self.source.as_ref(),
                    self.queue().as_ref(),
                    page_info.as_deref(),
                )
                .await?;
            }
            Job::SyncProduct { payload } => {
                sync_product::handle(&self.sync, payload).await?;
            }
        }
        Ok(())
    }

    /// Claim, run and finalize one job from the queue.
    ///
    /// Returns `Ok(false)` when the queue was empty. A failing job is marked
    /// failed and still counts as processed.
    ///
    /// # Errors
    ///
    /// Returns `QueueError` only if the queue itself fails.
    pub async fn process_next(&self) -> Result<bool, QueueError> {
        let Some(claimed) = self.queue().claim().await? else {
            return Ok(false);
        };
        self.finish(claimed).await?;
        Ok(true)
    }

    /// Process jobs until the queue is empty. Returns how many ran.
    ///
    /// # Errors
    ///
    /// Returns `QueueError` if the queue itself fails.
    pub async fn drain(&self) -> Result<usize, QueueError> {
        let mut processed = 0;
        while self.process_next().await? {
            processed += 1;
        }
        Ok(processed)
    }

    #[instrument(skip_all, fields(job_id = %claimed.id, job = claimed.job.name(), attempts = claimed.attempts))]
    async fn finish(&self, claimed: ClaimedJob) -> Result<(), QueueError> {
        match self.run(&claimed.job).await {
            Ok(()) => {
                info!("Job completed");
                self.queue().complete(claimed.id).await
            }
            Err(e) => {
                error!(error = %e, "Job failed");
                self.queue().fail(claimed.id, &e.to_string()).await
            }
        }
    }
}
