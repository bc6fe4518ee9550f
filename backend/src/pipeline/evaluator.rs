// Transition Evaluator - First-match rule evaluation for a single lead

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::rules::{RuleTable, TransitionConditions};
use super::stages::{PipelineStage, WorkflowType};

/// Snapshot of a lead's state, built fresh per evaluation call. The caller
/// supplies values derived from the lead's stored activity history; nothing
/// here is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadTransitionContext {
    pub workflow: WorkflowType,
    pub current_stage: PipelineStage,
    pub days_in_stage: i64,
    pub has_engagement: bool,
    pub conversion_probability: f64,
    pub days_since_last_activity: i64,
}

/// Engagement and inactivity derived from a lead's activity timestamps. Both
/// the batch runner and the evaluation endpoint go through this, so the two
/// cannot disagree about the same lead.
///
/// A lead with no recorded activity counts as inactive since creation, and
/// activity only counts as engagement strictly inside the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityProfile {
    pub days_since_last_activity: i64,
    pub has_engagement: bool,
}

impl ActivityProfile {
    pub fn derive(
        last_activity_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
        engagement_window_days: i64,
        now: DateTime<Utc>,
    ) -> Self {
        let days_since_last_activity = last_activity_at
            .map(|at| (now - at).num_days())
            .unwrap_or_else(|| (now - created_at).num_days());

        let has_engagement = last_activity_at
            .map(|at| (now - at).num_days() < engagement_window_days)
            .unwrap_or(false);

        Self {
            days_since_last_activity,
            has_engagement,
        }
    }
}

/// Outcome of one evaluation. Serializes camelCase to match the existing
/// backend contract (`shouldTransition` / `nextStage` / `reason`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransitionResult {
    pub should_transition: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_stage: Option<PipelineStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl TransitionResult {
    pub fn no_transition() -> Self {
        Self {
            should_transition: false,
            next_stage: None,
            reason: None,
        }
    }

    fn transition_to(from: PipelineStage, to: PipelineStage) -> Self {
        Self {
            should_transition: true,
            next_stage: Some(to),
            reason: Some(format!(
                "Met conditions for transition from {from} to {to}"
            )),
        }
    }
}

/// Scan the workflow's rules in declared order and apply the first one whose
/// source stage and conditions all match. Pure over its arguments; a workflow
/// or stage with no applicable rules degrades to "no transition", never an
/// error, so batch callers can treat every lead uniformly.
pub fn evaluate(table: &RuleTable, ctx: &LeadTransitionContext) -> TransitionResult {
    for rule in table.rules_for(ctx.workflow) {
        if rule.from_stage != ctx.current_stage {
            continue;
        }
        if conditions_met(&rule.conditions, ctx) {
            return TransitionResult::transition_to(ctx.current_stage, rule.to_stage);
        }
    }

    TransitionResult::no_transition()
}

fn conditions_met(conditions: &TransitionConditions, ctx: &LeadTransitionContext) -> bool {
    if let Some(min) = conditions.min_days_in_stage {
        if ctx.days_in_stage < min {
            return false;
        }
    }

    if let Some(max) = conditions.max_days_in_stage {
        if ctx.days_in_stage > max {
            return false;
        }
    }

    if conditions.engagement_required == Some(true) && !ctx.has_engagement {
        return false;
    }

    if let Some(threshold) = conditions.inactivity_days {
        if ctx.days_since_last_activity < threshold {
            return false;
        }
    }

    if let Some(range) = &conditions.conversion_probability_range {
        if !range.contains(ctx.conversion_probability) {
            return false;
        }
    }

    true
}
