pub mod sql;
pub mod sqlite_version;

use indoc::indoc;
use sql::QUEUE_MIGRATIONS;
use sqlite_version::fetch_and_check_sqlite_version;
use sqlx::{query, query_scalar, Connection, SqliteExecutor, SqlitePool};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("Error occured while parsing sqlite version: {0}")]
    ParseVersionError(#[from] std::num::ParseIntError),
    #[error("This version of sqlite_queue requires SQLite v3.35.0 or greater (detected `sqlite_version()` = {0})")]
    IncompatibleVersion(String),
    #[error("Error occured while migrate: {0}")]
    SqlError(#[from] sqlx::Error),
}

/// Creates the bookkeeping table that records applied migrations.
async fn install_migrations_table<'e, E>(executor: E) -> Result<(), MigrateError>
where
    E: SqliteExecutor<'e>,
{
    let sql = indoc! {r#"
        create table if not exists _job_queue_migrations (
            id integer primary key,
            ts text not null default (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        );
    "#};

    query(sql).execute(executor).await?;
    Ok(())
}

/// Returns the id of the last migration that was run against the database.
async fn get_last_migration<'e, E>(executor: E) -> Result<Option<u32>, MigrateError>
where
    E: SqliteExecutor<'e>,
{
    let last: Option<i64> =
        query_scalar("select id from _job_queue_migrations order by id desc limit 1")
            .fetch_optional(executor)
            .await?;

    Ok(last.and_then(|id| u32::try_from(id).ok()))
}

/// Runs the migrations against the database.
///
/// Every pending migration runs in its own transaction together with the
/// row recording it, so a failed migration leaves no trace.
pub async fn migrate(pool: &SqlitePool) -> Result<(), MigrateError> {
    let mut conn = pool.acquire().await?;

    let sqlite_version = fetch_and_check_sqlite_version(&mut *conn).await?;
    install_migrations_table(&mut *conn).await?;
    let last_migration = get_last_migration(&mut *conn).await?;

    let mut highest_migration = 0;
    let mut migrated = false;
    for migration in QUEUE_MIGRATIONS.iter() {
        let migration_number = migration.migration_number();
        highest_migration = highest_migration.max(migration_number);

        if last_migration.is_some_and(|last| migration_number <= last) {
            continue;
        }

        migrated = true;
        info!(
            migration_number,
            migration_name = migration.name(),
            sqlite_version,
            "Running migration {}",
            migration.name(),
        );
        let mut tx = conn.begin().await?;
        migration.execute(&mut tx).await?;
        query("insert into _job_queue_migrations (id) values (?1)")
            .bind(i64::from(migration_number))
            .execute(tx.as_mut())
            .await?;
        tx.commit().await?;
    }

    if migrated {
        info!("Migrations complete");
    }

    if let Some(last_migration) = last_migration {
        if highest_migration < last_migration {
            warn!(
                last_migration,
                highest_migration,
                "Database is using queue schema revision {}, but this build only knows up to revision {}. Attempting to continue regardless.",
                last_migration,
                highest_migration,
            );
        }
    }

    Ok(())
}
