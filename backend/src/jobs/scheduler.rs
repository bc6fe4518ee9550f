// Job Scheduler - Cron-driven bulk workflow transitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler as TokioScheduler, JobSchedulerError};
use tracing::info;
use uuid::Uuid;

use crate::pipeline::TransitionRunner;

#[derive(Error, Debug)]
pub enum JobError {
    #[error("Scheduler error: {0}")]
    SchedulerError(#[from] JobSchedulerError),
}

pub type JobResult<T> = Result<T, JobError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobExecutionLog {
    pub id: Uuid,
    pub job_name: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub status: JobStatus,
    pub leads_processed: i64,
    pub leads_transitioned: i64,
    pub errors: Vec<String>,
    pub duration_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum JobStatus {
    Completed,
    PartialFailure,
}

/// Keep only the most recent runs in memory.
const EXECUTION_LOG_LIMIT: usize = 100;

pub struct JobScheduler {
    scheduler: TokioScheduler,
    runner: TransitionRunner,
    transition_cron: String,
    execution_logs: Arc<RwLock<Vec<JobExecutionLog>>>,
}

impl JobScheduler {
    pub async fn new(runner: TransitionRunner, transition_cron: String) -> JobResult<Self> {
        let scheduler = TokioScheduler::new().await?;

        Ok(Self {
            scheduler,
            runner,
            transition_cron,
            execution_logs: Arc::new(RwLock::new(Vec::new())),
        })
    }

    pub async fn start(&self) -> JobResult<()> {
        info!("Starting background job scheduler");

        self.schedule_transition_run().await?;
        self.scheduler.start().await?;

        info!("Background job scheduler started successfully");
        Ok(())
    }

    pub async fn shutdown(&self) -> JobResult<()> {
        info!("Shutting down background job scheduler");
        let mut scheduler = self.scheduler.clone();
        scheduler.shutdown().await?;
        Ok(())
    }

    async fn schedule_transition_run(&self) -> JobResult<()> {
        let runner = self.runner.clone();
        let logs = self.execution_logs.clone();

        let job = Job::new_async(self.transition_cron.as_str(), move |_uuid, _lock| {
            let runner = runner.clone();
            let logs = logs.clone();

            Box::pin(async move {
                let started_at = Utc::now();
                info!("Running workflow transition job");

                let outcome = runner.run().await;

                let completed_at = Utc::now();
                let log = JobExecutionLog {
                    id: Uuid::new_v4(),
                    job_name: "Workflow Transitions".to_string(),
                    started_at,
                    completed_at,
                    status: if outcome.errors.is_empty() {
                        JobStatus::Completed
                    } else {
                        JobStatus::PartialFailure
                    },
                    leads_processed: outcome.report.processed_leads,
                    leads_transitioned: outcome.report.transitioned_leads,
                    errors: outcome.errors,
                    duration_ms: (completed_at - started_at).num_milliseconds(),
                };

                JobScheduler::record_execution(&logs, log).await;
            })
        })?;

        self.scheduler.add(job).await?;
        info!(
            "Scheduled workflow transitions with cron '{}'",
            self.transition_cron
        );

        Ok(())
    }

    async fn record_execution(logs: &RwLock<Vec<JobExecutionLog>>, log: JobExecutionLog) {
        let mut logs = logs.write().await;
        logs.push(log);
        if logs.len() > EXECUTION_LOG_LIMIT {
            logs.remove(0);
        }
    }

    /// Most recent runs, oldest first. Served by `GET /api/jobs/executions`.
    pub async fn get_execution_logs(&self) -> Vec<JobExecutionLog> {
        self.execution_logs.read().await.clone()
    }
}
