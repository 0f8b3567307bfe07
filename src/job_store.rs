use std::time::Duration;

use sqlite_queue_job::{Job, NewJob};
use sqlx::SqlitePool;

use crate::errors::{JobQueueError, Result};
use crate::pool::acquire_with_timeout;
use crate::sql::add_job::add_job;
use crate::sql::claim_jobs::claim_jobs;
use crate::sql::complete_job::complete_job;
use crate::sql::complete_recurrent_job::complete_recurrent_job;
use crate::sql::fail_job::fail_job;
use crate::sql::get_job::get_job;

/// Storage-level operations of the queue.
///
/// A `JobStore` is a cheap handle around a shared [`SqlitePool`]; clone it
/// freely across tasks. Every operation takes one pooled connection, waiting
/// at most [`JobStore::acquire_timeout`] for it.
#[derive(Clone, Debug)]
pub struct JobStore {
    pool: SqlitePool,
    worker_id: String,
    acquire_timeout: Duration,
}

fn validate(new_job: &NewJob) -> Result<()> {
    new_job.validate().map_err(JobQueueError::ValidationError)
}

impl JobStore {
    pub(crate) fn new(pool: SqlitePool, worker_id: String, acquire_timeout: Duration) -> Self {
        Self {
            pool,
            worker_id,
            acquire_timeout,
        }
    }

    /// Identifier written to `locked_by` when this store claims jobs.
    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn acquire_timeout(&self) -> Duration {
        self.acquire_timeout
    }

    /// Returns a handle sharing the same pool with a different acquisition deadline.
    pub fn with_acquire_timeout(&self, acquire_timeout: Duration) -> Self {
        Self {
            acquire_timeout,
            ..self.clone()
        }
    }

    /// Applies pending schema migrations.
    pub async fn migrate(&self) -> core::result::Result<(), sqlite_queue_migrations::MigrateError> {
        sqlite_queue_migrations::migrate(&self.pool).await
    }

    /// Validates and stores a new pending job, returning the stored row.
    pub async fn insert_job(&self, new_job: &NewJob) -> Result<Job> {
        validate(new_job)?;
        let mut conn = acquire_with_timeout(&self.pool, self.acquire_timeout).await?;
        add_job(&mut *conn, new_job).await
    }

    /// Claims up to `limit` eligible jobs for this store's worker id.
    ///
    /// Jobs come back in ascending id order. An empty vector means nothing
    /// was eligible.
    pub async fn claim(&self, limit: i64) -> Result<Vec<Job>> {
        if limit <= 0 {
            return Ok(Vec::new());
        }
        let mut conn = acquire_with_timeout(&self.pool, self.acquire_timeout).await?;
        claim_jobs(&mut *conn, &self.worker_id, limit).await
    }

    pub async fn mark_completed(&self, job_id: i64) -> Result<()> {
        let mut conn = acquire_with_timeout(&self.pool, self.acquire_timeout).await?;
        complete_job(&mut *conn, job_id).await
    }

    /// Records a failed attempt with its reason. `message` must not be empty.
    pub async fn mark_failed(&self, job_id: i64, message: &str) -> Result<()> {
        if message.is_empty() {
            return Err(JobQueueError::ValidationError(
                "failure message must not be empty".into(),
            ));
        }
        let mut conn = acquire_with_timeout(&self.pool, self.acquire_timeout).await?;
        fail_job(&mut *conn, job_id, message).await
    }

    /// Completes a recurrent job and enqueues `successor` atomically.
    ///
    /// The successor is validated before any connection is taken. Once the
    /// transaction has started, failures roll everything back and surface
    /// as [`JobQueueError::TransactionError`].
    pub async fn mark_recurrent_completed(&self, job_id: i64, successor: &NewJob) -> Result<Job> {
        validate(successor)?;
        let mut conn = acquire_with_timeout(&self.pool, self.acquire_timeout).await?;
        complete_recurrent_job(&mut conn, job_id, successor).await
    }

    /// Reads a job by id.
    pub async fn get_job(&self, job_id: i64) -> Result<Option<Job>> {
        let mut conn = acquire_with_timeout(&self.pool, self.acquire_timeout).await?;
        get_job(&mut *conn, job_id).await
    }
}
