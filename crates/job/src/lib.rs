use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use derive_builder::Builder;
use getset::Getters;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use thiserror::Error;

pub mod interval;
pub mod timestamp;

pub use interval::{Interval, ParseIntervalError};
use timestamp::{is_storable, parse_optional_timestamp};

/// Attempts granted to a job when the producer does not say otherwise.
pub const DEFAULT_MAX_ATTEMPTS: i64 = 25;

/// Lifecycle state of a job record, stored as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JobStatus {
    /// Waiting to be claimed
    #[default]
    Pending,
    /// Claimed by a worker
    Processing,
    /// Finished successfully, terminal unless the job recurs
    Completed,
    /// Last attempt failed, eligible for another claim
    Failed,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown job status `{0}`")]
pub struct UnknownStatusError(pub String);

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl Display for JobStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = UnknownStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(UnknownStatusError(other.to_string())),
        }
    }
}

/// `Job` is a snapshot of one row of the `job_queue` table.
///
/// Text columns that use the empty string for "unset" (`interval`,
/// `scheduled_for`, `locked_by`, `locked_at`, `completed_at`, `last_error`)
/// are surfaced as `None`.
#[derive(Getters, Debug, Clone, PartialEq, Eq)]
#[getset(get = "pub")]
pub struct Job {
    /// Store assigned identity, increasing with insertion order
    id: i64,
    /// Tag naming the handler that processes this job
    job_type: String,
    /// Opaque bytes handed to the handler
    payload: Vec<u8>,
    /// Secondary opaque bytes, may be empty
    payload_extra: Vec<u8>,
    status: JobStatus,
    /// How many times the job has been claimed
    attempts: i64,
    /// Retry ceiling, enforced by the worker loop, not by the store
    max_attempts: i64,
    /// Whether completing the job spawns a successor
    recurrent: bool,
    /// Spacing between occurrences of a recurrent job
    interval: Option<Interval>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    /// Earliest instant the job may be claimed, `None` means immediately
    scheduled_for: Option<DateTime<Utc>>,
    /// Worker holding the current claim
    locked_by: Option<String>,
    locked_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    /// Message of the last failure
    last_error: Option<String>,
}

fn decode_error(column: &str, source: impl std::error::Error + Send + Sync + 'static) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(source),
    }
}

fn get_timestamp(row: &SqliteRow, column: &str) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    let text: String = row.try_get(column)?;
    parse_optional_timestamp(&text).map_err(|e| decode_error(column, e))
}

fn get_required_timestamp(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    get_timestamp(row, column)?.ok_or_else(|| {
        decode_error(
            column,
            std::io::Error::new(std::io::ErrorKind::InvalidData, "timestamp is empty"),
        )
    })
}

fn get_optional_text(row: &SqliteRow, column: &str) -> Result<Option<String>, sqlx::Error> {
    let text: String = row.try_get(column)?;
    Ok((!text.is_empty()).then_some(text))
}

impl<'r> FromRow<'r, SqliteRow> for Job {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        let status = status
            .parse::<JobStatus>()
            .map_err(|e| decode_error("status", e))?;

        let interval = match get_optional_text(row, "interval")? {
            Some(text) => Some(
                text.parse::<Interval>()
                    .map_err(|e| decode_error("interval", e))?,
            ),
            None => None,
        };

        Ok(Job {
            id: row.try_get("id")?,
            job_type: row.try_get("job_type")?,
            payload: row.try_get("payload")?,
            payload_extra: row.try_get("payload_extra")?,
            status,
            attempts: row.try_get("attempts")?,
            max_attempts: row.try_get("max_attempts")?,
            recurrent: row.try_get("recurrent")?,
            interval,
            created_at: get_required_timestamp(row, "created_at")?,
            updated_at: get_required_timestamp(row, "updated_at")?,
            scheduled_for: get_timestamp(row, "scheduled_for")?,
            locked_by: get_optional_text(row, "locked_by")?,
            locked_at: get_timestamp(row, "locked_at")?,
            completed_at: get_timestamp(row, "completed_at")?,
            last_error: get_optional_text(row, "last_error")?,
        })
    }
}

impl Job {
    /// Deserializes the payload as JSON.
    pub fn json_payload<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.payload)
    }

    /// Builds the next occurrence of a recurrent job, due `interval` after `now`.
    ///
    /// Returns `None` when the job does not recur, has no interval, or the
    /// resulting instant is past the last storable timestamp.
    pub fn next_occurrence(&self, now: DateTime<Utc>) -> Option<NewJob> {
        if !self.recurrent {
            return None;
        }
        let interval = self.interval?;
        let scheduled_for = now
            .checked_add_signed(interval.to_time_delta()?)
            .filter(is_storable)?;

        Some(NewJob {
            job_type: self.job_type.clone(),
            payload: self.payload.clone(),
            payload_extra: self.payload_extra.clone(),
            max_attempts: self.max_attempts,
            recurrent: true,
            interval: Some(interval),
            scheduled_for: Some(scheduled_for),
        })
    }
}

/// A job that has not been stored yet.
///
/// ```
/// use sqlite_queue_job::{Interval, NewJob};
///
/// let job = NewJob::builder()
///     .job_type("digest")
///     .json_payload(&serde_json::json!({ "list": "weekly" }))
///     .unwrap()
///     .recurrent(true)
///     .interval(Interval::from_secs(7 * 24 * 3600))
///     .build();
///
/// assert_eq!(job.max_attempts(), &25);
/// ```
#[derive(Getters, Debug, Clone, PartialEq, Eq, Builder)]
#[getset(get = "pub")]
#[builder(
    build_fn(private, name = "build_internal"),
    pattern = "owned",
    derive(Clone)
)]
pub struct NewJob {
    #[builder(default, setter(into))]
    job_type: String,
    #[builder(default, setter(into))]
    payload: Vec<u8>,
    #[builder(default, setter(into))]
    payload_extra: Vec<u8>,
    #[builder(default = "DEFAULT_MAX_ATTEMPTS")]
    max_attempts: i64,
    #[builder(default)]
    recurrent: bool,
    #[builder(default, setter(strip_option))]
    interval: Option<Interval>,
    /// `None` makes the job claimable right away
    #[builder(default, setter(strip_option))]
    scheduled_for: Option<DateTime<Utc>>,
}

impl NewJob {
    pub fn builder() -> NewJobBuilder {
        NewJobBuilder::default()
    }

    /// Checks the producer-side rules a row must satisfy before it is written.
    pub fn validate(&self) -> Result<(), String> {
        if self.job_type.is_empty() {
            return Err("job_type must not be empty".into());
        }
        if self.payload.is_empty() {
            return Err("payload must not be empty".into());
        }
        if self.max_attempts < 0 {
            return Err(format!(
                "max_attempts must not be negative (got {})",
                self.max_attempts
            ));
        }
        if self.recurrent && self.interval.map_or(true, |interval| interval.is_zero()) {
            return Err("a recurrent job needs a non-zero interval".into());
        }
        if let Some(scheduled_for) = &self.scheduled_for {
            if !is_storable(scheduled_for) {
                return Err(format!(
                    "scheduled_for must be between years 0 and 9999 (got {scheduled_for})"
                ));
            }
        }
        Ok(())
    }
}

impl NewJobBuilder {
    /// Serializes `value` as JSON into the payload.
    pub fn json_payload<T: Serialize + ?Sized>(self, value: &T) -> serde_json::Result<Self> {
        Ok(self.payload(serde_json::to_vec(value)?))
    }

    /// Builds the NewJob with all configured values.
    pub fn build(self) -> NewJob {
        self.build_internal()
            .expect("All fields have defaults, build should never fail")
    }
}
