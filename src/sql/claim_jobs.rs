use indoc::indoc;
use sqlite_queue_job::Job;
use sqlx::{query_as, SqliteExecutor};
use tracing::debug;

use crate::errors::Result;

// Selection and locking happen in one statement, so two claimers can never
// both see a row as eligible.
const CLAIM_JOBS_SQL: &str = indoc! {r#"
    update job_queue
        set
            status = 'processing',
            attempts = attempts + 1,
            locked_by = ?1,
            locked_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now'),
            updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
        where id in (
            select id from job_queue
                where status in ('pending', 'failed')
                and (scheduled_for = '' or scheduled_for <= strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
                order by id asc
                limit ?2
        )
        returning *;
"#};

/// Locks up to `limit` eligible jobs for `worker_id`, oldest first.
#[tracing::instrument(skip_all, err, fields(otel.kind = "client", db.system = "sqlite"))]
pub async fn claim_jobs<'e>(
    executor: impl SqliteExecutor<'e>,
    worker_id: &str,
    limit: i64,
) -> Result<Vec<Job>> {
    if limit <= 0 {
        return Ok(Vec::new());
    }

    let mut jobs: Vec<Job> = query_as(CLAIM_JOBS_SQL)
        .bind(worker_id)
        .bind(limit)
        .fetch_all(executor)
        .await?;

    // RETURNING does not follow the subquery order
    jobs.sort_by_key(|job| *job.id());

    debug!(worker_id, claimed = jobs.len(), "Claimed jobs");

    Ok(jobs)
}
