//! Background sync jobs.
//!
//! A full sync is a fan-out: one [`Job::FetchProductsPage`] per catalog page,
//! each enqueueing a [`Job::SyncProduct`] per product plus the next page.
//! Jobs are independent and may complete in any order.
//!
//! # Architecture
//!
//! - [`JobQueue`] - durable ([`PgJobQueue`]) or in-process ([`MemoryJobQueue`]) queue
//! - [`JobRunner`] - dispatches a job to its handler
//! - [`WorkerPool`] - polling workers that claim, run and finalize jobs

pub mod fetch_products;
mod memory;
mod queue;
mod runner;
pub mod sync_product;
mod worker;

pub use memory::MemoryJobQueue;
pub use queue::PgJobQueue;
pub use runner::JobRunner;
pub use worker::WorkerPool;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::services::SyncError;
use crate::shopify::ShopifyError;

/// A unit of background work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Job {
    /// Fetch one catalog page and fan out its products.
    FetchProductsPage {
        /// Continuation token; `None` is the first page.
        page_info: Option<String>,
    },
    /// Map and upsert one raw product payload.
    SyncProduct { payload: serde_json::Value },
}

impl Job {
    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::FetchProductsPage { .. } => "fetch_products_page",
            Self::SyncProduct { .. } => "sync_product",
        }
    }
}

/// Lifecycle of a queued job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "job_status", rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

/// A job taken off the queue by a worker.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimedJob {
    pub id: Uuid,
    pub job: Job,
    /// Number of times this job has been claimed, including this one.
    pub attempts: i32,
}

/// Errors from the job queue itself.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("job payload error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors raised while running a job.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("catalog error: {0}")]
    Catalog(#[from] ShopifyError),

    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("sync error: {0}")]
    Sync(#[from] SyncError),
}

/// Queue of pending jobs.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Add a job. It becomes visible to workers immediately.
    async fn enqueue(&self, job: Job) -> Result<(), QueueError>;

    /// Take the oldest queued job, marking it running. `None` when the queue is empty.
    async fn claim(&self) -> Result<Option<ClaimedJob>, QueueError>;

    /// Mark a claimed job as completed.
    async fn complete(&self, id: Uuid) -> Result<(), QueueError>;

    /// Mark a claimed job as failed. Failed jobs are not retried.
    async fn fail(&self, id: Uuid, error: &str) -> Result<(), QueueError>;
}
