use std::str::FromStr;
use std::time::Duration;

use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool};

use crate::errors::{JobQueueError, Result};

/// How long an operation waits for a pooled connection by default.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(1);

/// How long SQLite waits on a locked database before reporting `SQLITE_BUSY`.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Takes a connection from the pool, giving up after `acquire_timeout`.
pub(crate) async fn acquire_with_timeout(
    pool: &SqlitePool,
    acquire_timeout: Duration,
) -> Result<PoolConnection<Sqlite>> {
    match tokio::time::timeout(acquire_timeout, pool.acquire()).await {
        Ok(conn) => Ok(conn?),
        Err(_elapsed) => Err(JobQueueError::ConnectionTimeoutError),
    }
}

/// Opens a pool on `database_url` configured for concurrent queue access.
///
/// The database file is created when missing, the journal runs in WAL mode
/// and writers wait on each other for up to five seconds.
pub async fn connect_pool(
    database_url: &str,
    max_connections: u32,
) -> core::result::Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}
