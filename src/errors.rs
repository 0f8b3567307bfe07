use thiserror::Error;

/// Errors returned by the job store operations.
///
/// Storage failures are classified once, when converting from [`sqlx::Error`],
/// so callers can match on the kind of failure without inspecting driver
/// messages.
#[derive(Error, Debug)]
pub enum JobQueueError {
    /// The request was rejected before reaching storage
    #[error("Invalid job: {0}")]
    ValidationError(String),

    /// A live job with the same type and payload already exists
    #[error("A job with the same type and payload is already queued")]
    DuplicateJobError,

    /// No pooled connection became available before the deadline
    #[error("Timed out while acquiring a database connection")]
    ConnectionTimeoutError,

    /// Any other storage failure, including rows that no longer decode
    #[error("Error occured while query: {0}")]
    StorageError(sqlx::Error),

    /// A multi-statement operation failed after it started; nothing was applied
    #[error("Transaction rolled back: {0}")]
    TransactionError(Box<JobQueueError>),
}

impl From<sqlx::Error> for JobQueueError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::PoolTimedOut => JobQueueError::ConnectionTimeoutError,
            sqlx::Error::Database(ref db_error) if db_error.is_unique_violation() => {
                JobQueueError::DuplicateJobError
            }
            error => JobQueueError::StorageError(error),
        }
    }
}

impl JobQueueError {
    /// The classified cause, looking through a [`JobQueueError::TransactionError`].
    pub fn root_cause(&self) -> &JobQueueError {
        match self {
            JobQueueError::TransactionError(inner) => inner.root_cause(),
            other => other,
        }
    }
}

/// A Result type alias for JobQueueError.
pub type Result<T> = core::result::Result<T, JobQueueError>;
