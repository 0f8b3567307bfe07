use indoc::indoc;
use sqlite_queue_job::timestamp::format_optional_timestamp;
use sqlite_queue_job::{Job, NewJob};
use sqlx::{query_as, SqliteExecutor};
use tracing::info;

use crate::errors::Result;

const INSERT_JOB_SQL: &str = indoc! {r#"
    insert into job_queue (
        job_type,
        payload,
        payload_extra,
        max_attempts,
        recurrent,
        interval,
        scheduled_for
    )
    values (?1, ?2, ?3, ?4, ?5, ?6, ?7)
    returning *;
"#};

/// Add a job to the queue
///
/// The job is expected to have passed [`NewJob::validate`] already.
#[tracing::instrument(skip_all, err, fields(otel.kind = "client", db.system = "sqlite"))]
pub async fn add_job<'e>(executor: impl SqliteExecutor<'e>, new_job: &NewJob) -> Result<Job> {
    let interval = new_job
        .interval()
        .map(|interval| interval.to_string())
        .unwrap_or_default();

    let job: Job = query_as(INSERT_JOB_SQL)
        .bind(new_job.job_type())
        .bind(new_job.payload())
        .bind(new_job.payload_extra())
        .bind(new_job.max_attempts())
        .bind(new_job.recurrent())
        .bind(interval)
        .bind(format_optional_timestamp(new_job.scheduled_for().as_ref()))
        .fetch_one(executor)
        .await?;

    info!(
        job_id = *job.id(),
        job_type = %job.job_type(),
        recurrent = *job.recurrent(),
        "Job added to queue"
    );

    Ok(job)
}
