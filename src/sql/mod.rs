pub mod add_job;
pub mod claim_jobs;
pub mod complete_job;
pub mod complete_recurrent_job;
pub mod fail_job;
pub mod get_job;
