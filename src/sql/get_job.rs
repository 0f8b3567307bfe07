use sqlite_queue_job::Job;
use sqlx::{query_as, SqliteExecutor};

use crate::errors::Result;

pub async fn get_job<'e>(executor: impl SqliteExecutor<'e>, job_id: i64) -> Result<Option<Job>> {
    let job = query_as("select * from job_queue where id = ?1")
        .bind(job_id)
        .fetch_optional(executor)
        .await?;

    Ok(job)
}
