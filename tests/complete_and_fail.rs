use helpers::with_test_db;
use sqlite_queue::{JobQueueError, JobStatus};

mod helpers;

#[tokio::test]
async fn it_should_complete_a_claimed_job() {
    with_test_db(|test_db| async move {
        let job = test_db.add_job("email", b"a").await;
        test_db.store.claim(1).await.unwrap();

        test_db.store.mark_completed(*job.id()).await.unwrap();

        let job = test_db.get_job(*job.id()).await;
        assert_eq!(job.status(), &JobStatus::Completed);
        assert!(job.completed_at().is_some());
        assert_eq!(job.locked_by(), &None);
        assert_eq!(job.locked_at(), &None);
        assert_eq!(job.attempts(), &1);

        assert!(test_db.store.claim(1).await.unwrap().is_empty());
    })
    .await;
}

#[tokio::test]
async fn it_should_clear_the_last_error_on_completion() {
    with_test_db(|test_db| async move {
        let job = test_db.add_job("email", b"a").await;
        test_db.store.claim(1).await.unwrap();
        test_db.store.mark_failed(*job.id(), "timeout").await.unwrap();
        test_db.store.claim(1).await.unwrap();

        test_db.store.mark_completed(*job.id()).await.unwrap();

        let job = test_db.get_job(*job.id()).await;
        assert_eq!(job.status(), &JobStatus::Completed);
        assert_eq!(job.last_error(), &None);
        assert_eq!(job.attempts(), &2);
    })
    .await;
}

#[tokio::test]
async fn it_should_record_a_failure() {
    with_test_db(|test_db| async move {
        let job = test_db.add_job("email", b"a").await;
        test_db.store.claim(1).await.unwrap();

        test_db
            .store
            .mark_failed(*job.id(), "connection refused")
            .await
            .unwrap();

        let job = test_db.get_job(*job.id()).await;
        assert_eq!(job.status(), &JobStatus::Failed);
        assert_eq!(job.last_error().as_deref(), Some("connection refused"));
        assert_eq!(job.locked_by(), &None);
        assert_eq!(job.locked_at(), &None);
        assert_eq!(job.completed_at(), &None);
    })
    .await;
}

#[tokio::test]
async fn it_should_let_the_last_writer_win() {
    with_test_db(|test_db| async move {
        let job = test_db.add_job("email", b"a").await;
        test_db.store.claim(1).await.unwrap();

        test_db.store.mark_completed(*job.id()).await.unwrap();
        test_db
            .store
            .mark_failed(*job.id(), "late failure report")
            .await
            .unwrap();

        let job = test_db.get_job(*job.id()).await;
        assert_eq!(job.status(), &JobStatus::Failed);
        assert_eq!(job.last_error().as_deref(), Some("late failure report"));
    })
    .await;
}

#[tokio::test]
async fn it_should_require_a_failure_message() {
    with_test_db(|test_db| async move {
        let job = test_db.add_job("email", b"a").await;
        test_db.store.claim(1).await.unwrap();

        let result = test_db.store.mark_failed(*job.id(), "").await;
        assert!(matches!(result, Err(JobQueueError::ValidationError(_))));

        let job = test_db.get_job(*job.id()).await;
        assert_eq!(job.status(), &JobStatus::Processing);
    })
    .await;
}

#[tokio::test]
async fn it_should_ignore_unknown_ids() {
    with_test_db(|test_db| async move {
        test_db.store.mark_completed(4242).await.unwrap();
        test_db.store.mark_failed(4242, "gone").await.unwrap();

        assert!(test_db.store.get_job(4242).await.unwrap().is_none());
        assert_eq!(test_db.count_jobs().await, 0);
    })
    .await;
}
