use indoc::indoc;
use sqlx::{query, SqliteExecutor};

use crate::errors::Result;

const COMPLETE_JOB_SQL: &str = indoc! {r#"
    update job_queue
        set
            status = 'completed',
            completed_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now'),
            updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now'),
            locked_by = '',
            locked_at = '',
            last_error = ''
        where id = ?1;
"#};

#[tracing::instrument(skip_all, err, fields(otel.kind = "client", db.system = "sqlite", job_id = job_id))]
pub async fn complete_job<'e>(executor: impl SqliteExecutor<'e>, job_id: i64) -> Result<()> {
    query(COMPLETE_JOB_SQL)
        .bind(job_id)
        .execute(executor)
        .await?;

    Ok(())
}
