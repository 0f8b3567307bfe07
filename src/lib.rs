//! A durable job queue stored in SQLite.
//!
//! Producers insert jobs, workers [`claim`](JobStore::claim) batches of
//! eligible jobs and report each outcome with
//! [`mark_completed`](JobStore::mark_completed),
//! [`mark_failed`](JobStore::mark_failed) or, for recurring work,
//! [`mark_recurrent_completed`](JobStore::mark_recurrent_completed), which
//! closes the finished occurrence and enqueues the next one atomically.
//!
//! Claims select and lock rows in a single statement, so concurrent workers
//! always receive disjoint batches. Handler invocation, retry backoff and
//! scheduling loops are left to the host application.
//!
//! ```no_run
//! use sqlite_queue::{Interval, NewJob, QueueOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = QueueOptions::default()
//!     .database_url("sqlite://jobs.db")
//!     .init()
//!     .await?;
//!
//! store
//!     .insert_job(
//!         &NewJob::builder()
//!             .job_type("nightly_report")
//!             .payload(b"{}".to_vec())
//!             .recurrent(true)
//!             .interval(Interval::from_secs(24 * 3600))
//!             .build(),
//!     )
//!     .await?;
//!
//! for job in store.claim(10).await? {
//!     match job.next_occurrence(chrono::Utc::now()) {
//!         Some(next) => {
//!             store.mark_recurrent_completed(*job.id(), &next).await?;
//!         }
//!         None => store.mark_completed(*job.id()).await?,
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod errors;
pub mod job_store;
mod pool;
mod sql;

pub use crate::builder::{QueueBuildError, QueueOptions};
pub use crate::errors::{JobQueueError, Result};
pub use crate::job_store::JobStore;
pub use crate::pool::{connect_pool, DEFAULT_ACQUIRE_TIMEOUT};
pub use sqlite_queue_job::*;
pub use sqlite_queue_migrations::MigrateError;
