//! In-process job queue.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{ClaimedJob, Job, JobQueue, JobStatus, QueueError};

#[derive(Debug, Default)]
struct Inner {
    queued: VecDeque<(Uuid, Job)>,
    attempts: HashMap<Uuid, i32>,
    finished: HashMap<Uuid, (JobStatus, Option<String>)>,
}

/// Job queue held in memory. Jobs are lost when the process exits.
///
/// Used by tests to observe what a handler enqueued, and by `mirror-cli`
/// dry runs.
#[derive(Debug, Default)]
pub struct MemoryJobQueue {
    inner: Mutex<Inner>,
}

impl MemoryJobQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queued jobs in FIFO order, left in place.
    pub async fn jobs(&self) -> Vec<Job> {
        self.inner
            .lock()
            .await
            .queued
            .iter()
            .map(|(_, job)| job.clone())
            .collect()
    }

    /// Remove and return all queued jobs.
    pub async fn take(&self) -> Vec<Job> {
        self.inner
            .lock()
            .await
            .queued
            .drain(..)
            .map(|(_, job)| job)
            .collect()
    }

    /// Number of queued jobs.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.queued.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Final status of a claimed job, with its error if it failed.
    pub async fn status(&self, id: Uuid) -> Option<(JobStatus, Option<String>)> {
        let inner = self.inner.lock().await;
        if let Some(finished) = inner.finished.get(&id) {
            return Some(finished.clone());
        }
        if inner.queued.iter().any(|(queued, _)| *queued == id) {
            return Some((JobStatus::Queued, None));
        }
        inner
            .attempts
            .contains_key(&id)
            .then_some((JobStatus::Running, None))
    }
}

#[async_trait]
impl JobQueue for MemoryJobQueue {
    async fn enqueue(&self, job: Job) -> Result<(), QueueError> {
        self.inner
            .lock()
            .await
            .queued
            .push_back((Uuid::new_v4(), job));
        Ok(())
    }

    async fn claim(&self) -> Result<Option<ClaimedJob>, QueueError> {
        let mut inner = self.inner.lock().await;
        let Some((id, job)) = inner.queued.pop_front() else {
            return Ok(None);
        };

        let attempts = inner.attempts.entry(id).or_default();
        *attempts += 1;

        Ok(Some(ClaimedJob {
            id,
            job,
            attempts: *attempts,
        }))
    }

    async fn complete(&self, id: Uuid) -> Result<(), QueueError> {
        self.inner
            .lock()
            .await
            .finished
            .insert(id, (JobStatus::Completed, None));
        Ok(())
    }

    async fn fail(&self, id: Uuid, error: &str) -> Result<(), QueueError> {
        self.inner
            .lock()
            .await
            .finished
            .insert(id, (JobStatus::Failed, Some(error.to_string())));
        Ok(())
    }
}
