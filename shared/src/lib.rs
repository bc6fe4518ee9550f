use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A CRM lead enrolled in a nurturing workflow.
///
/// `workflow` and `stage` are stored as their wire names ("Re-engagement",
/// "Early Nurture", ...) and parsed leniently where typed values are needed,
/// so a row with an unrecognized track still loads and is simply skipped by
/// the transition machinery.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub company: Option<String>,
    pub workflow: String,
    pub stage: String,
    /// Externally computed [0,1] conversion likelihood.
    pub conversion_probability: f64,
    /// When the lead entered its current stage.
    pub stage_entered_at: DateTime<Utc>,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One entry in a lead's activity trail.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadActivity {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub activity_type: String, // LEAD_STAGE_CHANGED, WORKFLOW_CHANGED
    pub source: String,        // USER, AUTOMATED
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
