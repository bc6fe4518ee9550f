// Pipeline Stages - Nurturing tracks and stages for low-conversion leads

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named lead-nurturing track. Determines which transition rules apply.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum WorkflowType {
    Hibernating,
    #[serde(rename = "Re-engagement")]
    ReEngagement,
    Education,
    #[serde(rename = "Long-term")]
    LongTerm,
}

impl WorkflowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hibernating => "Hibernating",
            Self::ReEngagement => "Re-engagement",
            Self::Education => "Education",
            Self::LongTerm => "Long-term",
        }
    }

    /// Lenient parse from a stored or wire value. Unknown names (including
    /// casing differences) return `None` so callers degrade to "no
    /// transition" instead of failing.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Hibernating" => Some(Self::Hibernating),
            "Re-engagement" => Some(Self::ReEngagement),
            "Education" => Some(Self::Education),
            "Long-term" => Some(Self::LongTerm),
            _ => None,
        }
    }

    pub fn all() -> [WorkflowType; 4] {
        [
            Self::Hibernating,
            Self::ReEngagement,
            Self::Education,
            Self::LongTerm,
        ]
    }
}

impl fmt::Display for WorkflowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A phase within a workflow's lead lifecycle. There is no global ordering;
/// each workflow defines its own path through a subset of stages via its
/// rule list.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    #[serde(rename = "Early Nurture")]
    EarlyNurture,
    Education,
    #[serde(rename = "Value Proposition")]
    ValueProposition,
    #[serde(rename = "Re-engagement")]
    ReEngagement,
    #[serde(rename = "Exit Decision")]
    ExitDecision,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EarlyNurture => "Early Nurture",
            Self::Education => "Education",
            Self::ValueProposition => "Value Proposition",
            Self::ReEngagement => "Re-engagement",
            Self::ExitDecision => "Exit Decision",
        }
    }

    /// Lenient parse, same contract as [`WorkflowType::parse`].
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Early Nurture" => Some(Self::EarlyNurture),
            "Education" => Some(Self::Education),
            "Value Proposition" => Some(Self::ValueProposition),
            "Re-engagement" => Some(Self::ReEngagement),
            "Exit Decision" => Some(Self::ExitDecision),
            _ => None,
        }
    }

    /// Stage a lead starts in when entering any workflow.
    pub fn entry() -> Self {
        Self::EarlyNurture
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
