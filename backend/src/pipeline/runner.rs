// Batch Runner - Evaluates and transitions all eligible leads in bulk

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use super::evaluator::{self, ActivityProfile, LeadTransitionContext};
use super::executor::TransitionExecutor;
use super::rules::RuleTable;
use super::stages::{PipelineStage, WorkflowType};
use crate::services::activity::ActivitySource;

/// Wire-facing run summary (`processedLeads` / `transitionedLeads`).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRunReport {
    pub processed_leads: i64,
    pub transitioned_leads: i64,
}

/// Full outcome of a run, for callers that also want the per-lead failures.
#[derive(Debug, Default)]
pub struct TransitionRunOutcome {
    pub report: TransitionRunReport,
    pub errors: Vec<String>,
}

#[derive(Debug, FromRow)]
struct LeadRunRow {
    id: Uuid,
    workflow: String,
    stage: String,
    conversion_probability: f64,
    stage_entered_at: DateTime<Utc>,
    last_activity_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

/// Enumerates leads due for evaluation and runs each through the evaluator,
/// executing matches sequentially. Leads are independent; per-lead failures
/// are collected and logged, never propagated, and even a failed enumeration
/// yields the default zero report rather than an error.
#[derive(Clone)]
pub struct TransitionRunner {
    db_pool: PgPool,
    rules: Arc<RuleTable>,
    executor: TransitionExecutor,
    engagement_window_days: i64,
}

impl TransitionRunner {
    pub fn new(
        db_pool: PgPool,
        rules: Arc<RuleTable>,
        executor: TransitionExecutor,
        engagement_window_days: i64,
    ) -> Self {
        Self {
            db_pool,
            rules,
            executor,
            engagement_window_days,
        }
    }

    pub async fn run(&self) -> TransitionRunOutcome {
        let mut outcome = TransitionRunOutcome::default();

        let leads = match self.fetch_leads().await {
            Ok(leads) => leads,
            Err(e) => {
                error!("Failed to enumerate leads for transition run: {}", e);
                outcome.errors.push(format!("Lead enumeration failed: {e}"));
                return outcome;
            }
        };

        let now = Utc::now();

        for lead in leads {
            outcome.report.processed_leads += 1;

            // Rows with an unrecognized workflow or stage are counted but
            // never transitioned, same as an unknown workflow in the table.
            let (Some(workflow), Some(stage)) = (
                WorkflowType::parse(&lead.workflow),
                PipelineStage::parse(&lead.stage),
            ) else {
                continue;
            };

            let ctx = self.build_context(&lead, workflow, stage, now);
            let result = evaluator::evaluate(&self.rules, &ctx);

            if !result.should_transition {
                continue;
            }
            let Some(next_stage) = result.next_stage else {
                continue;
            };

            let reason = result
                .reason
                .as_deref()
                .unwrap_or("Automated workflow transition");

            if self
                .executor
                .move_lead_to_stage(lead.id, next_stage, stage, reason, ActivitySource::Automated)
                .await
            {
                outcome.report.transitioned_leads += 1;
            } else {
                outcome
                    .errors
                    .push(format!("Transition failed for lead {}", lead.id));
            }
        }

        info!(
            "Transition run complete: {} leads processed, {} transitioned, {} failures",
            outcome.report.processed_leads,
            outcome.report.transitioned_leads,
            outcome.errors.len()
        );

        outcome
    }

    fn build_context(
        &self,
        lead: &LeadRunRow,
        workflow: WorkflowType,
        current_stage: PipelineStage,
        now: DateTime<Utc>,
    ) -> LeadTransitionContext {
        let profile = ActivityProfile::derive(
            lead.last_activity_at,
            lead.created_at,
            self.engagement_window_days,
            now,
        );

        LeadTransitionContext {
            workflow,
            current_stage,
            days_in_stage: (now - lead.stage_entered_at).num_days(),
            has_engagement: profile.has_engagement,
            conversion_probability: lead.conversion_probability,
            days_since_last_activity: profile.days_since_last_activity,
        }
    }

    async fn fetch_leads(&self) -> Result<Vec<LeadRunRow>, sqlx::Error> {
        sqlx::query_as::<_, LeadRunRow>(
            r#"
            SELECT id, workflow, stage, conversion_probability,
                   stage_entered_at, last_activity_at, created_at
            FROM leads
            ORDER BY stage_entered_at ASC
            "#,
        )
        .fetch_all(&self.db_pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::executor::FallbackPolicy;
    use crate::services::activity::ActivityService;
    use chrono::Duration;
    use sqlx::postgres::PgPoolOptions;

    fn test_runner(engagement_window_days: i64) -> TransitionRunner {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/cadence_test")
            .unwrap();
        let activity = ActivityService::new(pool.clone());
        let executor = TransitionExecutor::new(pool.clone(), activity, FallbackPolicy::Strict);

        TransitionRunner::new(
            pool,
            Arc::new(RuleTable::standard()),
            executor,
            engagement_window_days,
        )
    }

    fn lead_row(
        stage_entered_at: DateTime<Utc>,
        last_activity_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
    ) -> LeadRunRow {
        LeadRunRow {
            id: Uuid::new_v4(),
            workflow: "Education".to_string(),
            stage: "Education".to_string(),
            conversion_probability: 0.42,
            stage_entered_at,
            last_activity_at,
            created_at,
        }
    }

    #[tokio::test]
    async fn test_build_context_engagement_window_boundary() {
        let runner = test_runner(7);
        let now = Utc::now();
        let created_at = now - Duration::days(90);

        // Activity exactly one window old no longer counts as engagement.
        let lead = lead_row(now - Duration::days(10), Some(now - Duration::days(7)), created_at);
        let ctx = runner.build_context(
            &lead,
            WorkflowType::Education,
            PipelineStage::Education,
            now,
        );
        assert!(!ctx.has_engagement);
        assert_eq!(ctx.days_since_last_activity, 7);

        let lead = lead_row(now - Duration::days(10), Some(now - Duration::days(6)), created_at);
        let ctx = runner.build_context(
            &lead,
            WorkflowType::Education,
            PipelineStage::Education,
            now,
        );
        assert!(ctx.has_engagement);
        assert_eq!(ctx.days_since_last_activity, 6);
    }

    #[tokio::test]
    async fn test_build_context_no_activity_falls_back_to_lead_age() {
        let runner = test_runner(7);
        let now = Utc::now();

        let lead = lead_row(now - Duration::days(10), None, now - Duration::days(60));
        let ctx = runner.build_context(
            &lead,
            WorkflowType::Education,
            PipelineStage::Education,
            now,
        );

        assert_eq!(ctx.days_since_last_activity, 60);
        assert!(!ctx.has_engagement);
    }

    #[tokio::test]
    async fn test_build_context_days_in_stage_from_stage_entry() {
        let runner = test_runner(7);
        let now = Utc::now();

        let lead = lead_row(
            now - Duration::days(14),
            Some(now - Duration::days(3)),
            now - Duration::days(30),
        );
        let ctx = runner.build_context(
            &lead,
            WorkflowType::Education,
            PipelineStage::Education,
            now,
        );

        assert_eq!(ctx.days_in_stage, 14);
        assert_eq!(ctx.workflow, WorkflowType::Education);
        assert_eq!(ctx.current_stage, PipelineStage::Education);
        assert_eq!(ctx.conversion_probability, 0.42);
    }

    #[test]
    fn test_report_wire_shape() {
        let report = TransitionRunReport {
            processed_leads: 12,
            transitioned_leads: 3,
        };

        let json = serde_json::to_value(report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"processedLeads": 12, "transitionedLeads": 3})
        );
    }

    #[test]
    fn test_default_report_is_zeroed() {
        let outcome = TransitionRunOutcome::default();
        assert_eq!(outcome.report.processed_leads, 0);
        assert_eq!(outcome.report.transitioned_leads, 0);
        assert!(outcome.errors.is_empty());
    }
}
