// Transition Rules - Per-workflow stage progression rules

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use super::stages::{PipelineStage, WorkflowType};

/// Inclusive conversion-probability bounds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ProbabilityRange {
    pub min: f64,
    pub max: f64,
}

impl ProbabilityRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Inclusive on both ends: `min` and `max` themselves are accepted.
    pub fn contains(&self, probability: f64) -> bool {
        probability >= self.min && probability <= self.max
    }
}

/// Conditions guarding a transition rule. An unset field means "no
/// constraint"; all present fields must hold (AND semantics, no any-of).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConditions {
    /// Inclusive lower bound on days spent in the current stage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_days_in_stage: Option<i64>,
    /// Inclusive upper bound on days spent in the current stage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_days_in_stage: Option<i64>,
    /// When `Some(true)`, the lead must have recent engagement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engagement_required: Option<bool>,
    /// Inclusive bounds on the lead's conversion probability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversion_probability_range: Option<ProbabilityRange>,
    /// Inclusive lower bound on days since the lead's last activity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inactivity_days: Option<i64>,
}

impl TransitionConditions {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_unconstrained(&self) -> bool {
        self.min_days_in_stage.is_none()
            && self.max_days_in_stage.is_none()
            && self.engagement_required.is_none()
            && self.conversion_probability_range.is_none()
            && self.inactivity_days.is_none()
    }
}

/// A source-stage/destination-stage pair guarded by optional conditions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRule {
    pub from_stage: PipelineStage,
    pub to_stage: PipelineStage,
    #[serde(default)]
    pub conditions: TransitionConditions,
}

impl TransitionRule {
    pub fn new(from_stage: PipelineStage, to_stage: PipelineStage) -> Self {
        Self {
            from_stage,
            to_stage,
            conditions: TransitionConditions::none(),
        }
    }

    pub fn min_days_in_stage(mut self, days: i64) -> Self {
        self.conditions.min_days_in_stage = Some(days);
        self
    }

    pub fn max_days_in_stage(mut self, days: i64) -> Self {
        self.conditions.max_days_in_stage = Some(days);
        self
    }

    pub fn engagement_required(mut self) -> Self {
        self.conditions.engagement_required = Some(true);
        self
    }

    pub fn conversion_probability(mut self, min: f64, max: f64) -> Self {
        self.conditions.conversion_probability_range = Some(ProbabilityRange::new(min, max));
        self
    }

    pub fn inactivity_days(mut self, days: i64) -> Self {
        self.conditions.inactivity_days = Some(days);
        self
    }
}

/// Ordered transition rules per workflow. The declared order within a
/// workflow IS the precedence policy: the evaluator applies the first rule
/// whose source stage and conditions match, so reordering rules changes
/// behavior.
///
/// The table is an immutable value injected where needed; there is no
/// process-wide singleton. Tests build bespoke tables directly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleTable {
    workflows: HashMap<WorkflowType, Vec<TransitionRule>>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workflow(mut self, workflow: WorkflowType, rules: Vec<TransitionRule>) -> Self {
        self.workflows.insert(workflow, rules);
        self
    }

    /// Ordered rules for a workflow. A workflow missing from the table yields
    /// an empty slice; the evaluator treats that as "no transition possible",
    /// never an error.
    pub fn rules_for(&self, workflow: WorkflowType) -> &[TransitionRule] {
        self.workflows
            .get(&workflow)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn workflow_count(&self) -> usize {
        self.workflows.len()
    }

    /// Load an alternate table from a JSON file (selected via `RULES_PATH`).
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let table = serde_json::from_str(&raw)?;
        Ok(table)
    }

    /// The default nurturing table for low-conversion leads.
    pub fn standard() -> Self {
        use PipelineStage::*;

        Self::new()
            .with_workflow(
                WorkflowType::Hibernating,
                vec![
                    TransitionRule::new(EarlyNurture, Education).min_days_in_stage(14),
                    TransitionRule::new(Education, ReEngagement)
                        .min_days_in_stage(30)
                        .inactivity_days(14),
                    TransitionRule::new(ReEngagement, ExitDecision)
                        .min_days_in_stage(21)
                        .conversion_probability(0.0, 0.2),
                ],
            )
            .with_workflow(
                WorkflowType::ReEngagement,
                vec![
                    TransitionRule::new(EarlyNurture, ReEngagement).min_days_in_stage(7),
                    TransitionRule::new(ReEngagement, ValueProposition)
                        .engagement_required()
                        .conversion_probability(0.3, 1.0),
                    TransitionRule::new(ReEngagement, ExitDecision)
                        .min_days_in_stage(30)
                        .conversion_probability(0.0, 0.3),
                ],
            )
            .with_workflow(
                WorkflowType::Education,
                vec![
                    TransitionRule::new(EarlyNurture, Education).min_days_in_stage(5),
                    TransitionRule::new(Education, ValueProposition)
                        .min_days_in_stage(10)
                        .engagement_required(),
                    TransitionRule::new(ValueProposition, ReEngagement)
                        .min_days_in_stage(14)
                        .inactivity_days(7),
                    TransitionRule::new(ValueProposition, ExitDecision)
                        .min_days_in_stage(45)
                        .conversion_probability(0.0, 0.15),
                ],
            )
            .with_workflow(
                WorkflowType::LongTerm,
                vec![
                    TransitionRule::new(EarlyNurture, Education).min_days_in_stage(30),
                    TransitionRule::new(Education, ValueProposition)
                        .min_days_in_stage(45)
                        .engagement_required(),
                    TransitionRule::new(ValueProposition, ExitDecision)
                        .min_days_in_stage(60)
                        .inactivity_days(30)
                        .conversion_probability(0.0, 0.1),
                ],
            )
    }
}
