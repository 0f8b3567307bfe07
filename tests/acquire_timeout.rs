use std::time::{Duration, Instant};

use sqlite_queue::{connect_pool, JobQueueError, NewJob, QueueOptions, DEFAULT_ACQUIRE_TIMEOUT};

mod helpers;

#[tokio::test]
async fn it_should_time_out_when_the_pool_is_exhausted() {
    helpers::enable_logs().await;
    let dir = tempfile::tempdir().unwrap();
    let db_url = format!("sqlite://{}", dir.path().join("queue.db").display());
    let pool = connect_pool(&db_url, 1).await.unwrap();

    let store = QueueOptions::default()
        .sqlite_pool(pool.clone())
        .acquire_timeout(Duration::from_millis(200))
        .init()
        .await
        .expect("Failed to open job store");
    assert_eq!(store.acquire_timeout(), Duration::from_millis(200));

    let held = pool.acquire().await.unwrap();

    let started = Instant::now();
    let result = store.claim(1).await;
    assert!(matches!(result, Err(JobQueueError::ConnectionTimeoutError)));
    assert!(started.elapsed() >= Duration::from_millis(200));

    let result = store
        .insert_job(
            &NewJob::builder()
                .job_type("email")
                .payload(b"x".to_vec())
                .build(),
        )
        .await;
    assert!(matches!(result, Err(JobQueueError::ConnectionTimeoutError)));

    drop(held);
    assert!(store.claim(1).await.unwrap().is_empty());
}

#[tokio::test]
async fn it_should_default_to_one_second() {
    helpers::enable_logs().await;
    let dir = tempfile::tempdir().unwrap();
    let db_url = format!("sqlite://{}", dir.path().join("queue.db").display());

    let store = QueueOptions::default()
        .database_url(&db_url)
        .max_connections(2)
        .init()
        .await
        .expect("Failed to open job store");

    assert_eq!(store.acquire_timeout(), DEFAULT_ACQUIRE_TIMEOUT);
    assert_eq!(DEFAULT_ACQUIRE_TIMEOUT, Duration::from_secs(1));
    assert!(store.worker_id().starts_with("sqlite_queue_"));

    let quick = store.with_acquire_timeout(Duration::from_millis(50));
    assert_eq!(quick.acquire_timeout(), Duration::from_millis(50));
    assert_eq!(quick.worker_id(), store.worker_id());
}

#[tokio::test]
async fn it_should_require_a_database() {
    let result = QueueOptions::default().init().await;
    assert!(matches!(
        result,
        Err(sqlite_queue::QueueBuildError::MissingDatabaseUrl)
    ));
}
