use sqlite_queue_job::{Job, NewJob};
use sqlx::{Connection, SqliteConnection};
use tracing::{info, warn};

use super::add_job::add_job;
use super::complete_job::complete_job;
use crate::errors::{JobQueueError, Result};

fn transaction_error(error: impl Into<JobQueueError>) -> JobQueueError {
    JobQueueError::TransactionError(Box::new(error.into()))
}

/// Completes `job_id` and inserts `successor` in a single transaction.
///
/// Either both writes land or neither does. Any failure after `BEGIN` is
/// reported as [`JobQueueError::TransactionError`] wrapping its cause.
#[tracing::instrument(skip_all, err, fields(otel.kind = "client", db.system = "sqlite", job_id = job_id))]
pub async fn complete_recurrent_job(
    conn: &mut SqliteConnection,
    job_id: i64,
    successor: &NewJob,
) -> Result<Job> {
    let mut tx = conn.begin().await.map_err(transaction_error)?;

    let result = async {
        complete_job(&mut *tx, job_id).await?;
        add_job(&mut *tx, successor).await
    }
    .await;

    match result {
        Ok(next_job) => {
            tx.commit().await.map_err(transaction_error)?;
            info!(
                job_id,
                next_job_id = *next_job.id(),
                "Recurrent job completed and rescheduled"
            );
            Ok(next_job)
        }
        Err(error) => {
            if let Err(rollback_error) = tx.rollback().await {
                warn!(
                    job_id,
                    error = %rollback_error,
                    "Failed to roll back recurrent job completion"
                );
            }
            Err(transaction_error(error))
        }
    }
}
