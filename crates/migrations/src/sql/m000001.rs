use indoc::indoc;

use super::QueueMigration;

pub const M000001_MIGRATION: QueueMigration = QueueMigration {
    name: "m000001",
    stmts: &[indoc! {r#"
        create table job_queue (
            id integer primary key autoincrement,
            job_type text not null check (job_type <> ''),
            payload blob not null check (length(payload) > 0),
            payload_extra blob not null default x'',
            status text not null default 'pending'
                check (status in ('pending', 'processing', 'completed', 'failed')),
            attempts integer not null default 0,
            max_attempts integer not null default 25,
            recurrent integer not null default 0,
            interval text not null default '',
            created_at text not null default (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
            updated_at text not null default (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
            scheduled_for text not null default '',
            locked_by text not null default '',
            locked_at text not null default '',
            completed_at text not null default '',
            last_error text not null default ''
        );
    "#}],
};
