use indoc::indoc;
use sqlx::{query, SqliteExecutor};

use crate::errors::Result;

const FAIL_JOB_SQL: &str = indoc! {r#"
    update job_queue
        set
            status = 'failed',
            last_error = ?2,
            updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now'),
            locked_by = '',
            locked_at = ''
        where id = ?1;
"#};

/// Records a failed attempt. The job becomes claimable again right away.
#[tracing::instrument(skip_all, err, fields(otel.kind = "client", db.system = "sqlite", job_id = job_id))]
pub async fn fail_job<'e>(
    executor: impl SqliteExecutor<'e>,
    job_id: i64,
    message: &str,
) -> Result<()> {
    query(FAIL_JOB_SQL)
        .bind(job_id)
        .bind(message)
        .execute(executor)
        .await?;

    Ok(())
}
