use std::time::Duration;

use anyhow::{bail, Context};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlite_queue::{Interval, Job, JobQueueError, JobStore, NewJob, QueueOptions};
use tracing::{info, warn};
use tracing_subscriber::{
    filter::EnvFilter, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
};

fn enable_logs() {
    let fmt_layer = tracing_subscriber::fmt::layer();
    // Log level set to debug except for sqlx set at warn (to not show all sql requests)
    let filter_layer = EnvFilter::try_new("debug,sqlx=warn").unwrap();

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}

#[derive(Deserialize, Serialize, Debug)]
struct SendEmail {
    to: String,
}

#[derive(Deserialize, Serialize, Debug)]
struct Heartbeat {
    service: String,
}

async fn handle(job: &Job) -> anyhow::Result<()> {
    match job.job_type().as_str() {
        "send_email" => {
            let email: SendEmail = job.json_payload().context("Invalid email payload")?;
            if email.to.ends_with("@invalid") {
                bail!("mailbox {} does not exist", email.to);
            }
            info!(to = %email.to, attempt = *job.attempts(), "Sent email");
        }
        "heartbeat" => {
            let beat: Heartbeat = job.json_payload().context("Invalid heartbeat payload")?;
            info!(service = %beat.service, "Heartbeat");
        }
        other => bail!("no handler for job type `{other}`"),
    }
    Ok(())
}

/// Runs one claimed job and reports its outcome to the store.
async fn process(store: &JobStore, job: Job) -> Result<(), JobQueueError> {
    if job.attempts() > job.max_attempts() {
        warn!(job_id = *job.id(), "Skipping job after too many attempts");
        return store
            .mark_failed(
                *job.id(),
                &format!("max attempts exceeded ({})", job.max_attempts()),
            )
            .await;
    }

    match handle(&job).await {
        Ok(()) => match job.next_occurrence(Utc::now()) {
            Some(next) => match store.mark_recurrent_completed(*job.id(), &next).await {
                Ok(_) => Ok(()),
                // Another worker already queued this occurrence
                Err(error) if matches!(error.root_cause(), JobQueueError::DuplicateJobError) => {
                    store.mark_completed(*job.id()).await
                }
                Err(error) => Err(error),
            },
            None => store.mark_completed(*job.id()).await,
        },
        Err(error) => store.mark_failed(*job.id(), &format!("{error:#}")).await,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    enable_logs();

    let store = QueueOptions::default()
        .database_url("sqlite://worker_loop_demo.db")
        .max_connections(4)
        .init()
        .await?;

    let jobs = [
        NewJob::builder()
            .job_type("send_email")
            .json_payload(&SendEmail {
                to: "ops@example.com".into(),
            })?
            .max_attempts(3)
            .build(),
        NewJob::builder()
            .job_type("send_email")
            .json_payload(&SendEmail {
                to: "nobody@invalid".into(),
            })?
            .max_attempts(2)
            .build(),
        NewJob::builder()
            .job_type("heartbeat")
            .json_payload(&Heartbeat {
                service: "billing".into(),
            })?
            .recurrent(true)
            .interval("2s".parse::<Interval>()?)
            .build(),
    ];

    for new_job in &jobs {
        match store.insert_job(new_job).await {
            Ok(_) | Err(JobQueueError::DuplicateJobError) => {}
            Err(error) => return Err(error.into()),
        }
    }

    let mut poll = tokio::time::interval(Duration::from_millis(500));
    for _ in 0..20 {
        poll.tick().await;
        for job in store.claim(4).await? {
            process(&store, job).await?;
        }
    }

    Ok(())
}
