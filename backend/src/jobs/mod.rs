// Background Jobs
//
// Scheduled background work for the Cadence platform, driven by
// tokio-cron-scheduler. The only recurring job today is the bulk workflow
// transition run.

pub mod scheduler;

pub use scheduler::{JobError, JobExecutionLog, JobResult, JobScheduler, JobStatus};
