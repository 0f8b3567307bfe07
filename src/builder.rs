use std::time::Duration;

use rand::RngCore;
use sqlite_queue_migrations::migrate;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::pool::{connect_pool, DEFAULT_ACQUIRE_TIMEOUT};
use crate::JobStore;

/// Configuration options for opening a [`JobStore`].
///
/// # Example
///
/// ```no_run
/// use sqlite_queue::QueueOptions;
/// use std::time::Duration;
///
/// async fn example() -> Result<(), Box<dyn std::error::Error>> {
///     let store = QueueOptions::default()
///         .database_url("sqlite://jobs.db")
///         .max_connections(4)
///         .acquire_timeout(Duration::from_millis(500))
///         .init()
///         .await?;
///
///     let jobs = store.claim(10).await?;
///     println!("claimed {} jobs", jobs.len());
///     Ok(())
/// }
/// ```
#[derive(Default)]
pub struct QueueOptions {
    /// Existing pool shared with the host application
    sqlite_pool: Option<SqlitePool>,

    /// SQLite connection string, e.g. `sqlite://jobs.db`
    database_url: Option<String>,

    /// Maximum number of connections when the pool is created here
    max_connections: Option<u32>,

    /// How long an operation waits for a pooled connection
    acquire_timeout: Option<Duration>,

    /// Value written to `locked_by` on claim
    worker_id: Option<String>,
}

/// Errors that can occur when opening a job store.
#[derive(Error, Debug)]
pub enum QueueBuildError {
    /// Failed to connect to the SQLite database
    #[error("Error occurred while connecting to the SQLite database: {0}")]
    ConnectError(#[from] sqlx::Error),

    /// The database URL was not provided and no pool was supplied
    #[error("Missing database_url configuration - must provide either database_url or sqlite_pool")]
    MissingDatabaseUrl,

    /// Failed to apply database migrations
    #[error("Error occurred while migrating the database schema: {0}")]
    MigrationError(#[from] sqlite_queue_migrations::MigrateError),
}

fn random_worker_id() -> String {
    let mut random_bytes = [0u8; 9];
    rand::rng().fill_bytes(&mut random_bytes);
    format!("sqlite_queue_{}", hex::encode(random_bytes))
}

impl QueueOptions {
    /// Connects, migrates the schema and returns a ready [`JobStore`].
    ///
    /// # Errors
    /// Can fail if:
    /// * Database URL is missing and no pool was provided
    /// * Database connection fails
    /// * Migrations fail
    pub async fn init(self) -> Result<JobStore, QueueBuildError> {
        let pool = match self.sqlite_pool {
            Some(pool) => pool,
            None => {
                let db_url = self
                    .database_url
                    .ok_or(QueueBuildError::MissingDatabaseUrl)?;
                let max_connections = self
                    .max_connections
                    .unwrap_or_else(|| num_cpus::get() as u32);

                connect_pool(&db_url, max_connections).await?
            }
        };

        migrate(&pool).await?;

        Ok(JobStore::new(
            pool,
            self.worker_id.unwrap_or_else(random_worker_id),
            self.acquire_timeout.unwrap_or(DEFAULT_ACQUIRE_TIMEOUT),
        ))
    }

    /// Sets an existing SQLite pool for the store to use.
    ///
    /// If both `sqlite_pool` and `database_url` are provided, `sqlite_pool`
    /// takes precedence. The pool stays owned by the caller; `max_connections`
    /// is ignored for it.
    pub fn sqlite_pool(mut self, value: SqlitePool) -> Self {
        self.sqlite_pool = Some(value);
        self
    }

    /// Sets the SQLite connection URL.
    ///
    /// The database file is created if it does not exist.
    pub fn database_url(mut self, value: &str) -> Self {
        self.database_url = Some(value.into());
        self
    }

    /// Sets the maximum number of connections in the pool.
    ///
    /// # Default
    /// The number of logical CPUs.
    pub fn max_connections(mut self, value: u32) -> Self {
        self.max_connections = Some(value);
        self
    }

    /// Sets how long each operation waits for a pooled connection before
    /// failing with a connection timeout.
    ///
    /// # Default
    /// One second.
    pub fn acquire_timeout(mut self, value: Duration) -> Self {
        self.acquire_timeout = Some(value);
        self
    }

    /// Sets the identifier recorded in `locked_by` for claimed jobs.
    ///
    /// # Default
    /// `sqlite_queue_` followed by 18 random hex characters.
    pub fn worker_id(mut self, value: &str) -> Self {
        self.worker_id = Some(value.into());
        self
    }
}
