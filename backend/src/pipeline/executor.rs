// Transition Executor - Persists stage/workflow changes and records activity

use rand::Rng;
use sqlx::PgPool;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::stages::{PipelineStage, WorkflowType};
use crate::services::activity::{ActivityService, ActivitySource, ActivityType};

/// What to do when persistence fails mid-transition. Injected rather than
/// hard-coded so production deployments surface failures instead of masking
/// them; only development environments should select `Simulate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Log the failure and report the transition as unsuccessful.
    #[default]
    Strict,
    /// Log the failure, wait a short artificial delay, then proceed as if
    /// the write had succeeded. The activity entry is still recorded.
    Simulate,
}

impl FallbackPolicy {
    pub fn from_mode(mode: &str) -> Self {
        match mode.to_ascii_lowercase().as_str() {
            "simulate" | "development" | "dev" => Self::Simulate,
            _ => Self::Strict,
        }
    }
}

/// Side-effecting wrapper around the evaluator's decisions. Every operation
/// returns a bare success flag; failures are logged, never propagated, so
/// batch callers can treat each lead independently.
#[derive(Clone)]
pub struct TransitionExecutor {
    db_pool: PgPool,
    activity: ActivityService,
    fallback: FallbackPolicy,
}

impl TransitionExecutor {
    pub fn new(db_pool: PgPool, activity: ActivityService, fallback: FallbackPolicy) -> Self {
        Self {
            db_pool,
            activity,
            fallback,
        }
    }

    /// Move a lead to a new stage within its current workflow. Returns `true`
    /// on genuine success, and under [`FallbackPolicy::Simulate`] also on
    /// simulated success after a persistence failure. Returns `false` when
    /// the lead is missing, the write fails under [`FallbackPolicy::Strict`],
    /// or the activity entry cannot be recorded.
    pub async fn move_lead_to_stage(
        &self,
        lead_id: Uuid,
        new_stage: PipelineStage,
        current_stage: PipelineStage,
        reason: &str,
        source: ActivitySource,
    ) -> bool {
        let outcome = sqlx::query(
            "UPDATE leads
             SET stage = $2, stage_entered_at = NOW(), updated_at = NOW()
             WHERE id = $1",
        )
        .bind(lead_id)
        .bind(new_stage.as_str())
        .execute(&self.db_pool)
        .await
        .map(|done| done.rows_affected() > 0);

        if !self.apply_fallback(outcome, lead_id, "stage change").await {
            return false;
        }

        let payload = serde_json::json!({
            "old_stage": current_stage,
            "new_stage": new_stage,
            "reason": reason,
        });

        match self
            .activity
            .record(lead_id, ActivityType::LeadStageChanged, source, payload)
            .await
        {
            Ok(_) => {
                info!(
                    "Moved lead {} from {} to {}: {}",
                    lead_id, current_stage, new_stage, reason
                );
                true
            }
            Err(e) => {
                error!(
                    "Failed to record stage change activity for lead {}: {}",
                    lead_id, e
                );
                false
            }
        }
    }

    /// Switch a lead to a different nurturing workflow. The lead re-enters
    /// the new workflow at its entry stage and its stage clock restarts.
    pub async fn change_lead_workflow(
        &self,
        lead_id: Uuid,
        new_workflow: WorkflowType,
        current_workflow: WorkflowType,
        reason: &str,
        source: ActivitySource,
    ) -> bool {
        let outcome = sqlx::query(
            "UPDATE leads
             SET workflow = $2, stage = $3, stage_entered_at = NOW(), updated_at = NOW()
             WHERE id = $1",
        )
        .bind(lead_id)
        .bind(new_workflow.as_str())
        .bind(PipelineStage::entry().as_str())
        .execute(&self.db_pool)
        .await
        .map(|done| done.rows_affected() > 0);

        if !self.apply_fallback(outcome, lead_id, "workflow change").await {
            return false;
        }

        let payload = serde_json::json!({
            "old_workflow": current_workflow,
            "new_workflow": new_workflow,
            "reason": reason,
        });

        match self
            .activity
            .record(lead_id, ActivityType::WorkflowChanged, source, payload)
            .await
        {
            Ok(_) => {
                info!(
                    "Changed workflow for lead {} from {} to {}: {}",
                    lead_id, current_workflow, new_workflow, reason
                );
                true
            }
            Err(e) => {
                error!(
                    "Failed to record workflow change activity for lead {}: {}",
                    lead_id, e
                );
                false
            }
        }
    }

    /// Resolve a persistence outcome under the configured fallback policy.
    /// A missing lead is a data problem, not backend unavailability, and is
    /// reported as failure under both policies.
    async fn apply_fallback(
        &self,
        outcome: Result<bool, sqlx::Error>,
        lead_id: Uuid,
        operation: &str,
    ) -> bool {
        match outcome {
            Ok(true) => true,
            Ok(false) => {
                warn!("Lead {} not found during {}", lead_id, operation);
                false
            }
            Err(e) => match self.fallback {
                FallbackPolicy::Strict => {
                    error!("Failed to persist {} for lead {}: {}", operation, lead_id, e);
                    false
                }
                FallbackPolicy::Simulate => {
                    warn!(
                        "Simulating successful {} for lead {} after persistence failure: {}",
                        operation, lead_id, e
                    );
                    let delay_ms = rand::thread_rng().gen_range(200..600);
                    tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
                    true
                }
            },
        }
    }
}
