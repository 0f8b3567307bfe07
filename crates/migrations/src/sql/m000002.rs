use indoc::indoc;

use super::QueueMigration;

pub const M000002_MIGRATION: QueueMigration = QueueMigration {
    name: "m000002",
    stmts: &[
        // Serves the claim predicate and its id ordering
        indoc! {r#"
            create index job_queue_claim_idx
                on job_queue (status, scheduled_for, id);
        "#},
        // One live job per (job_type, payload); finished rows may repeat it
        indoc! {r#"
            create unique index job_queue_live_payload_idx
                on job_queue (job_type, payload)
                where status in ('pending', 'processing', 'failed');
        "#},
    ],
};
