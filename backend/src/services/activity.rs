use cadence_shared::LeadActivity;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ActivityError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type ActivityResult<T> = Result<T, ActivityError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityType {
    LeadStageChanged,
    WorkflowChanged,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LeadStageChanged => "LEAD_STAGE_CHANGED",
            Self::WorkflowChanged => "WORKFLOW_CHANGED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivitySource {
    User,
    Automated,
}

impl ActivitySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Automated => "AUTOMATED",
        }
    }
}

/// Insert-only activity trail for leads. Transitions are only considered
/// complete once their activity entry is recorded.
#[derive(Clone)]
pub struct ActivityService {
    pool: PgPool,
}

impl ActivityService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn record(
        &self,
        lead_id: Uuid,
        activity_type: ActivityType,
        source: ActivitySource,
        payload: JsonValue,
    ) -> ActivityResult<Uuid> {
        let id: (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO lead_activities (id, lead_id, activity_type, source, payload)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(lead_id)
        .bind(activity_type.as_str())
        .bind(source.as_str())
        .bind(&payload)
        .fetch_one(&self.pool)
        .await?;

        Ok(id.0)
    }

    /// Newest-first activity entries for one lead.
    pub async fn lead_history(
        &self,
        lead_id: Uuid,
        limit: i64,
    ) -> ActivityResult<Vec<LeadActivity>> {
        let entries = sqlx::query_as(
            r#"
            SELECT id, lead_id, activity_type, source, payload, created_at
            FROM lead_activities
            WHERE lead_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(lead_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
