//! `PostgreSQL` job queue on the `sync_jobs` table.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{instrument, warn};
use uuid::Uuid;

use super::{ClaimedJob, Job, JobQueue, JobStatus, QueueError};

#[derive(Debug, sqlx::FromRow)]
struct ClaimedRow {
    id: Uuid,
    payload: serde_json::Value,
    attempts: i32,
}

/// Durable queue shared by every worker connected to the same database.
///
/// Claims use `FOR UPDATE SKIP LOCKED`, so concurrent workers never take the
/// same row.
#[derive(Debug, Clone)]
pub struct PgJobQueue {
    pool: PgPool,
}

impl PgJobQueue {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Number of jobs currently in `status`.
    ///
    /// # Errors
    ///
    /// Returns error if the database query fails.
    pub async fn count_by_status(&self, status: JobStatus) -> Result<u64, QueueError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sync_jobs WHERE status = $1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;

        Ok(u64::try_from(count).unwrap_or_default())
    }
}

#[async_trait]
impl JobQueue for PgJobQueue {
    #[instrument(skip(self, job), fields(job = job.name()))]
    async fn enqueue(&self, job: Job) -> Result<(), QueueError> {
        let payload = serde_json::to_value(&job)?;

        sqlx::query("INSERT INTO sync_jobs (id, payload) VALUES ($1, $2)")
            .bind(Uuid::new_v4())
            .bind(payload)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn claim(&self) -> Result<Option<ClaimedJob>, QueueError> {
        let row = sqlx::query_as::<_, ClaimedRow>(
            r"
            UPDATE sync_jobs
            SET status = 'running', attempts = attempts + 1, started_at = NOW()
            WHERE id = (
                SELECT id FROM sync_jobs
                WHERE status = 'queued'
                ORDER BY created_at
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, payload, attempts
            ",
        )
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        match serde_json::from_value::<Job>(row.payload) {
            Ok(job) => Ok(Some(ClaimedJob {
                id: row.id,
                job,
                attempts: row.attempts,
            })),
            Err(e) => {
                // Undecodable rows would otherwise stay `running` forever.
                warn!(job_id = %row.id, error = %e, "Discarding job with invalid payload");
                self.fail(row.id, &e.to_string()).await?;
                Err(QueueError::Serialize(e))
            }
        }
    }

    async fn complete(&self, id: Uuid) -> Result<(), QueueError> {
        sqlx::query(
            "UPDATE sync_jobs SET status = 'completed', finished_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fail(&self, id: Uuid, error: &str) -> Result<(), QueueError> {
        sqlx::query(
            r"
            UPDATE sync_jobs
            SET status = 'failed', last_error = $2, finished_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "Requires a PostgreSQL database (MIRROR_DATABASE_URL) with migrations applied"]
    async fn test_claim_is_fifo_and_exclusive() {
        let url = std::env::var("MIRROR_DATABASE_URL").unwrap_or_default();
        let pool = PgPool::connect(&url).await.expect("Failed to connect");
        sqlx::query("DELETE FROM sync_jobs")
            .execute(&pool)
            .await
            .expect("clear queue");
        let queue = PgJobQueue::new(pool);

        queue
            .enqueue(Job::FetchProductsPage { page_info: None })
            .await
            .expect("enqueue first");
        queue
            .enqueue(Job::FetchProductsPage {
                page_info: Some("next".to_string()),
            })
            .await
            .expect("enqueue second");

        let first = queue.claim().await.expect("claim").expect("job available");
        assert_eq!(first.job, Job::FetchProductsPage { page_info: None });
        assert_eq!(first.attempts, 1);

        let second = queue.claim().await.expect("claim").expect("job available");
        assert_ne!(first.id, second.id);
        assert!(queue.claim().await.expect("claim").is_none());

        queue.complete(first.id).await.expect("complete");
        queue.fail(second.id, "boom").await.expect("fail");

        assert_eq!(queue.count_by_status(JobStatus::Completed).await.expect("count"), 1);
        assert_eq!(queue.count_by_status(JobStatus::Failed).await.expect("count"), 1);
    }
}
