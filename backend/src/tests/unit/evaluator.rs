// Unit tests for the transition evaluator against the standard rule table

use crate::pipeline::{
    evaluate, LeadTransitionContext, PipelineStage, RuleTable, TransitionRule, WorkflowType,
};

fn context(workflow: WorkflowType, stage: PipelineStage) -> LeadTransitionContext {
    LeadTransitionContext {
        workflow,
        current_stage: stage,
        days_in_stage: 0,
        has_engagement: false,
        conversion_probability: 0.5,
        days_since_last_activity: 0,
    }
}

// ============================================
// Standard table scenarios
// ============================================

#[test]
fn test_reengagement_early_nurture_transitions_at_seven_days() {
    let table = RuleTable::standard();
    let mut ctx = context(WorkflowType::ReEngagement, PipelineStage::EarlyNurture);
    ctx.days_in_stage = 7;

    let result = evaluate(&table, &ctx);
    assert!(result.should_transition);
    assert_eq!(result.next_stage, Some(PipelineStage::ReEngagement));
    assert_eq!(
        result.reason.as_deref(),
        Some("Met conditions for transition from Early Nurture to Re-engagement")
    );
}

#[test]
fn test_reengagement_early_nurture_holds_at_six_days() {
    let table = RuleTable::standard();
    let mut ctx = context(WorkflowType::ReEngagement, PipelineStage::EarlyNurture);
    ctx.days_in_stage = 6;

    let result = evaluate(&table, &ctx);
    assert!(!result.should_transition);
    assert!(result.next_stage.is_none());
}

#[test]
fn test_hibernating_education_transitions_when_stale() {
    let table = RuleTable::standard();
    let mut ctx = context(WorkflowType::Hibernating, PipelineStage::Education);
    ctx.days_in_stage = 30;
    ctx.days_since_last_activity = 14;

    let result = evaluate(&table, &ctx);
    assert!(result.should_transition);
    assert_eq!(result.next_stage, Some(PipelineStage::ReEngagement));
}

#[test]
fn test_hibernating_education_holds_below_inactivity_threshold() {
    let table = RuleTable::standard();
    let mut ctx = context(WorkflowType::Hibernating, PipelineStage::Education);
    ctx.days_in_stage = 30;
    ctx.days_since_last_activity = 13;

    assert!(!evaluate(&table, &ctx).should_transition);
}

#[test]
fn test_education_value_proposition_reengages_inactive_leads() {
    let table = RuleTable::standard();
    let mut ctx = context(WorkflowType::Education, PipelineStage::ValueProposition);
    ctx.days_in_stage = 14;
    ctx.days_since_last_activity = 7;

    let result = evaluate(&table, &ctx);
    assert!(result.should_transition);
    assert_eq!(result.next_stage, Some(PipelineStage::ReEngagement));
}

#[test]
fn test_nonexistent_workflow_name_never_evaluates() {
    // "LONGTERM" is not a wire name; the lenient parse refuses it and the
    // caller answers "no transition" without ever reaching the evaluator.
    assert!(WorkflowType::parse("LONGTERM").is_none());
}

// ============================================
// Per-field condition boundaries
// ============================================

#[test]
fn test_min_days_in_stage_boundary() {
    let table = RuleTable::new().with_workflow(
        WorkflowType::Education,
        vec![
            TransitionRule::new(PipelineStage::EarlyNurture, PipelineStage::Education)
                .min_days_in_stage(10),
        ],
    );
    let mut ctx = context(WorkflowType::Education, PipelineStage::EarlyNurture);

    ctx.days_in_stage = 9;
    assert!(!evaluate(&table, &ctx).should_transition);

    ctx.days_in_stage = 10;
    assert!(evaluate(&table, &ctx).should_transition);
}

#[test]
fn test_max_days_in_stage_boundary() {
    let table = RuleTable::new().with_workflow(
        WorkflowType::Education,
        vec![
            TransitionRule::new(PipelineStage::EarlyNurture, PipelineStage::Education)
                .max_days_in_stage(10),
        ],
    );
    let mut ctx = context(WorkflowType::Education, PipelineStage::EarlyNurture);

    ctx.days_in_stage = 10;
    assert!(evaluate(&table, &ctx).should_transition);

    ctx.days_in_stage = 11;
    assert!(!evaluate(&table, &ctx).should_transition);
}

#[test]
fn test_inactivity_days_boundary() {
    let table = RuleTable::new().with_workflow(
        WorkflowType::Hibernating,
        vec![
            TransitionRule::new(PipelineStage::Education, PipelineStage::ReEngagement)
                .inactivity_days(14),
        ],
    );
    let mut ctx = context(WorkflowType::Hibernating, PipelineStage::Education);

    ctx.days_since_last_activity = 13;
    assert!(!evaluate(&table, &ctx).should_transition);

    ctx.days_since_last_activity = 14;
    assert!(evaluate(&table, &ctx).should_transition);
}

#[test]
fn test_engagement_required_gate() {
    let table = RuleTable::new().with_workflow(
        WorkflowType::Education,
        vec![
            TransitionRule::new(PipelineStage::Education, PipelineStage::ValueProposition)
                .engagement_required(),
        ],
    );
    let mut ctx = context(WorkflowType::Education, PipelineStage::Education);

    assert!(!evaluate(&table, &ctx).should_transition);

    ctx.has_engagement = true;
    assert!(evaluate(&table, &ctx).should_transition);
}

#[test]
fn test_conversion_probability_inclusive_bounds() {
    let table = RuleTable::new().with_workflow(
        WorkflowType::ReEngagement,
        vec![
            TransitionRule::new(PipelineStage::ReEngagement, PipelineStage::ExitDecision)
                .conversion_probability(0.0, 0.3),
        ],
    );
    let mut ctx = context(WorkflowType::ReEngagement, PipelineStage::ReEngagement);

    ctx.conversion_probability = 0.0;
    assert!(evaluate(&table, &ctx).should_transition);

    ctx.conversion_probability = 0.3;
    assert!(evaluate(&table, &ctx).should_transition);

    ctx.conversion_probability = 0.31;
    assert!(!evaluate(&table, &ctx).should_transition);

    ctx.conversion_probability = -0.01;
    assert!(!evaluate(&table, &ctx).should_transition);
}

// ============================================
// Ordering and degradation
// ============================================

#[test]
fn test_declared_order_is_precedence() {
    // Rule A (to Education) precedes rule B (to Exit Decision) and both
    // match; A must win. Swapping them flips the outcome.
    let forward = RuleTable::new().with_workflow(
        WorkflowType::LongTerm,
        vec![
            TransitionRule::new(PipelineStage::EarlyNurture, PipelineStage::Education),
            TransitionRule::new(PipelineStage::EarlyNurture, PipelineStage::ExitDecision),
        ],
    );
    let reversed = RuleTable::new().with_workflow(
        WorkflowType::LongTerm,
        vec![
            TransitionRule::new(PipelineStage::EarlyNurture, PipelineStage::ExitDecision),
            TransitionRule::new(PipelineStage::EarlyNurture, PipelineStage::Education),
        ],
    );

    let ctx = context(WorkflowType::LongTerm, PipelineStage::EarlyNurture);
    assert_eq!(
        evaluate(&forward, &ctx).next_stage,
        Some(PipelineStage::Education)
    );
    assert_eq!(
        evaluate(&reversed, &ctx).next_stage,
        Some(PipelineStage::ExitDecision)
    );
}

#[test]
fn test_later_rule_matches_when_earlier_fails() {
    let table = RuleTable::new().with_workflow(
        WorkflowType::ReEngagement,
        vec![
            TransitionRule::new(PipelineStage::ReEngagement, PipelineStage::ValueProposition)
                .engagement_required(),
            TransitionRule::new(PipelineStage::ReEngagement, PipelineStage::ExitDecision)
                .min_days_in_stage(30),
        ],
    );

    let mut ctx = context(WorkflowType::ReEngagement, PipelineStage::ReEngagement);
    ctx.days_in_stage = 30;

    // No engagement, so the first rule fails and the scan continues.
    assert_eq!(
        evaluate(&table, &ctx).next_stage,
        Some(PipelineStage::ExitDecision)
    );
}

#[test]
fn test_workflow_absent_from_table_degrades_quietly() {
    let table = RuleTable::new();

    for stage in [
        PipelineStage::EarlyNurture,
        PipelineStage::Education,
        PipelineStage::ValueProposition,
        PipelineStage::ReEngagement,
        PipelineStage::ExitDecision,
    ] {
        let mut ctx = context(WorkflowType::Hibernating, stage);
        ctx.days_in_stage = 365;
        ctx.days_since_last_activity = 365;

        let result = evaluate(&table, &ctx);
        assert!(!result.should_transition);
        assert!(result.next_stage.is_none());
        assert!(result.reason.is_none());
    }
}

#[test]
fn test_known_workflow_unmatched_stage_degrades_quietly() {
    let table = RuleTable::standard();

    // Exit Decision is terminal in every standard workflow.
    for workflow in WorkflowType::all() {
        let mut ctx = context(workflow, PipelineStage::ExitDecision);
        ctx.days_in_stage = 365;
        ctx.days_since_last_activity = 365;

        let result = evaluate(&table, &ctx);
        assert!(!result.should_transition, "{workflow} left Exit Decision");
        assert!(result.next_stage.is_none());
    }
}
