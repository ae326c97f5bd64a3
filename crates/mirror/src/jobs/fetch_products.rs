//! Page fetch job: one catalog page in, one sync job per product out.

use tracing::{info, instrument};

use crate::shopify::CatalogSource;

use super::{Job, JobError, JobQueue};

/// Fetch the page at `page_info` and enqueue its work.
///
/// Enqueues one [`Job::SyncProduct`] per product, then one
/// [`Job::FetchProductsPage`] for the next page if there is one. Returns the
/// number of jobs enqueued.
///
/// # Errors
///
/// Fails without enqueueing anything if the fetch fails. An enqueue failure
/// part-way through leaves the earlier jobs queued.
#[instrument(skip(source, queue))]
pub async fn handle(
    source: &dyn CatalogSource,
    queue: &dyn JobQueue,
    page_info: Option<&str>,
) -> Result<usize, JobError> {
    let page = source.fetch_page(page_info).await?;
    let has_next_page = page.next_page_info.is_some();
    let mut enqueued = 0;

    for payload in page.products {
        queue.enqueue(Job::SyncProduct { payload }).await?;
        enqueued += 1;
    }

    if let Some(next) = page.next_page_info {
        queue
            .enqueue(Job::FetchProductsPage {
                page_info: Some(next),
            })
            .await?;
        enqueued += 1;
    }

    info!(enqueued, has_next_page, "Dispatched products page");
    Ok(enqueued)
}
