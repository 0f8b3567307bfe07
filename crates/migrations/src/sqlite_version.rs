use sqlx::{query_scalar, SqliteExecutor};

use crate::MigrateError;

/// `UPDATE ... RETURNING`, which the claim statement relies on, landed in 3.35.0.
const MIN_SQLITE_VERSION: (u32, u32, u32) = (3, 35, 0);

/// Fetches the SQLite library version and checks it is recent enough for the queue
pub async fn fetch_and_check_sqlite_version<'e, E>(executor: E) -> Result<String, MigrateError>
where
    E: SqliteExecutor<'e>,
{
    let version: String = query_scalar("select sqlite_version()")
        .fetch_one(executor)
        .await?;

    check_sqlite_version(&version)?;
    Ok(version)
}

/// Checks that a `major.minor.patch` SQLite version is compatible with the queue
pub fn check_sqlite_version(version: &str) -> Result<(u32, u32, u32), MigrateError> {
    let mut parts = version.split('.').map(str::parse::<u32>);
    let mut next = || parts.next().transpose().map(Option::unwrap_or_default);
    let parsed = (next()?, next()?, next()?);

    if parsed < MIN_SQLITE_VERSION {
        return Err(MigrateError::IncompatibleVersion(version.to_string()));
    }

    Ok(parsed)
}
