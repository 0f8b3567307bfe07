#![allow(dead_code)]

use std::sync::Arc;

use sqlite_queue::{connect_pool, Job, JobStore, NewJob, QueueOptions};
use sqlx::{query, query_scalar, SqlitePool};
use tempfile::TempDir;
use tokio::sync::OnceCell;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub struct TestDatabase {
    // Dropping the last handle deletes the database files
    dir: Arc<TempDir>,
    pub test_pool: SqlitePool,
    pub store: JobStore,
}

impl TestDatabase {
    /// A store on the same database claiming as `worker_id`.
    pub async fn store_for(&self, worker_id: &str) -> JobStore {
        QueueOptions::default()
            .sqlite_pool(self.test_pool.clone())
            .worker_id(worker_id)
            .init()
            .await
            .expect("Failed to open job store")
    }

    pub async fn add_job(&self, job_type: &str, payload: &[u8]) -> Job {
        self.store
            .insert_job(
                &NewJob::builder()
                    .job_type(job_type)
                    .payload(payload.to_vec())
                    .build(),
            )
            .await
            .expect("Failed to add job")
    }

    pub async fn get_job(&self, job_id: i64) -> Job {
        self.store
            .get_job(job_id)
            .await
            .expect("Failed to get job")
            .expect("Job should exist")
    }

    pub async fn count_jobs(&self) -> i64 {
        query_scalar("select count(*) from job_queue")
            .fetch_one(&self.test_pool)
            .await
            .expect("Failed to count jobs")
    }

    /// Overwrites a text column directly, bypassing the store.
    pub async fn set_text_column(&self, job_id: i64, column: &str, value: &str) {
        query(&format!("update job_queue set {column} = ?1 where id = ?2"))
            .bind(value)
            .bind(job_id)
            .execute(&self.test_pool)
            .await
            .expect("Failed to update job");
    }
}

pub async fn create_test_database() -> TestDatabase {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_url = format!("sqlite://{}", dir.path().join("queue.db").display());
    let test_pool = connect_pool(&db_url, 4)
        .await
        .expect("Failed to connect to test database");

    let store = QueueOptions::default()
        .sqlite_pool(test_pool.clone())
        .worker_id("test_worker")
        .init()
        .await
        .expect("Failed to open job store");

    TestDatabase {
        dir: Arc::new(dir),
        test_pool,
        store,
    }
}

pub async fn with_test_db<F, Fut>(test_fn: F)
where
    F: FnOnce(TestDatabase) -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    enable_logs().await;
    let test_db = create_test_database().await;
    let dir = test_db.dir.clone();
    let pool = test_db.test_pool.clone();
    test_fn(test_db).await;
    pool.close().await;
    drop(dir);
}

pub async fn enable_logs() {
    static ONCE: OnceCell<()> = OnceCell::const_new();

    ONCE.get_or_init(|| async {
        let fmt_layer = tracing_subscriber::fmt::layer().with_test_writer();
        // Debug everywhere except sqlx, which would log every statement
        let filter_layer = EnvFilter::try_new("debug,sqlx=warn").unwrap();

        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .init();
    })
    .await;
}
