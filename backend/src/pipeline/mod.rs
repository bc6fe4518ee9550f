// Lead Nurturing Pipeline
//
// Stage-transition machinery for low-conversion leads: an ordered rule table
// per workflow, a pure first-match evaluator, the executor that persists
// transitions, and the batch runner that sweeps all eligible leads.

pub mod evaluator;
pub mod executor;
pub mod rules;
pub mod runner;
pub mod stages;

pub use evaluator::{evaluate, ActivityProfile, LeadTransitionContext, TransitionResult};
pub use executor::{FallbackPolicy, TransitionExecutor};
pub use rules::{ProbabilityRange, RuleTable, TransitionConditions, TransitionRule};
pub use runner::{TransitionRunReport, TransitionRunner};
pub use stages::{PipelineStage, WorkflowType};
