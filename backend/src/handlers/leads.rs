use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{ApiResult, AppError};
use crate::pipeline::{
    self, ActivityProfile, LeadTransitionContext, PipelineStage, TransitionResult, WorkflowType,
};
use crate::services::activity::ActivitySource;
use crate::AppState;

#[derive(Serialize, Deserialize)]
pub struct ChangeStageRequest {
    pub new_stage: String,
    pub current_stage: String,
    pub reason: String,
}

#[derive(Serialize, Deserialize)]
pub struct ChangeWorkflowRequest {
    pub new_workflow: String,
    pub current_workflow: String,
    pub reason: String,
}

#[derive(Serialize, Deserialize)]
pub struct EvaluateTransitionRequest {
    pub current_workflow: String,
    pub current_stage: String,
    pub days_in_stage: i64,
    pub conversion_probability: f64,
    pub last_activity_date: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize)]
pub struct OperationStatus {
    pub success: bool,
}

#[derive(Serialize, Deserialize)]
pub struct LeadQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub workflow: Option<String>,
}

pub fn lead_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_leads))
        .route("/:id", get(get_lead))
        .route("/:id/activities", get(get_lead_activities))
        .route("/:id/change-stage", post(change_stage))
        .route("/:id/change-workflow", post(change_workflow))
        .route("/:id/evaluate-transition", post(evaluate_transition))
}

async fn list_leads(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LeadQuery>,
) -> ApiResult<Json<Vec<cadence_shared::Lead>>> {
    let limit = params.limit.unwrap_or(50);
    let offset = params.offset.unwrap_or(0);

    let leads = if let Some(workflow) = params.workflow {
        sqlx::query_as::<_, cadence_shared::Lead>(
            "SELECT id, name, email, company, workflow, stage, conversion_probability,
                    stage_entered_at, last_activity_at, created_at, updated_at
             FROM leads
             WHERE workflow = $1
             ORDER BY stage_entered_at ASC
             LIMIT $2 OFFSET $3",
        )
        .bind(workflow)
        .bind(limit)
        .bind(offset)
        .fetch_all(&state.db_pool)
        .await?
    } else {
        sqlx::query_as::<_, cadence_shared::Lead>(
            "SELECT id, name, email, company, workflow, stage, conversion_probability,
                    stage_entered_at, last_activity_at, created_at, updated_at
             FROM leads
             ORDER BY stage_entered_at ASC
             LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&state.db_pool)
        .await?
    };

    Ok(Json(leads))
}

async fn get_lead(
    State(state): State<Arc<AppState>>,
    Path(lead_id): Path<Uuid>,
) -> ApiResult<Json<cadence_shared::Lead>> {
    let lead = sqlx::query_as::<_, cadence_shared::Lead>(
        "SELECT id, name, email, company, workflow, stage, conversion_probability,
                stage_entered_at, last_activity_at, created_at, updated_at
         FROM leads
         WHERE id = $1",
    )
    .bind(lead_id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Lead".to_string()))?;

    Ok(Json(lead))
}

async fn get_lead_activities(
    State(state): State<Arc<AppState>>,
    Path(lead_id): Path<Uuid>,
) -> ApiResult<Json<Vec<cadence_shared::LeadActivity>>> {
    let entries = state
        .activity
        .lead_history(lead_id, 100)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

    Ok(Json(entries))
}

async fn change_stage(
    State(state): State<Arc<AppState>>,
    Path(lead_id): Path<Uuid>,
    Json(payload): Json<ChangeStageRequest>,
) -> ApiResult<Json<OperationStatus>> {
    let new_stage = PipelineStage::parse(&payload.new_stage)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown stage '{}'", payload.new_stage)))?;
    let current_stage = PipelineStage::parse(&payload.current_stage).ok_or_else(|| {
        AppError::BadRequest(format!("Unknown stage '{}'", payload.current_stage))
    })?;

    let success = state
        .executor
        .move_lead_to_stage(
            lead_id,
            new_stage,
            current_stage,
            &payload.reason,
            ActivitySource::User,
        )
        .await;

    Ok(Json(OperationStatus { success }))
}

async fn change_workflow(
    State(state): State<Arc<AppState>>,
    Path(lead_id): Path<Uuid>,
    Json(payload): Json<ChangeWorkflowRequest>,
) -> ApiResult<Json<OperationStatus>> {
    let new_workflow = WorkflowType::parse(&payload.new_workflow).ok_or_else(|| {
        AppError::BadRequest(format!("Unknown workflow '{}'", payload.new_workflow))
    })?;
    let current_workflow = WorkflowType::parse(&payload.current_workflow).ok_or_else(|| {
        AppError::BadRequest(format!("Unknown workflow '{}'", payload.current_workflow))
    })?;

    let success = state
        .executor
        .change_lead_workflow(
            lead_id,
            new_workflow,
            current_workflow,
            &payload.reason,
            ActivitySource::User,
        )
        .await;

    Ok(Json(OperationStatus { success }))
}

/// Server-side mirror of the transition decision. Calls the same evaluator as
/// the batch runner and derives engagement and inactivity from the lead's
/// stored timestamps through the same `ActivityProfile`, so clients and the
/// scheduler can never disagree. An unrecognized workflow or stage answers
/// "no transition", never an error.
async fn evaluate_transition(
    State(state): State<Arc<AppState>>,
    Path(lead_id): Path<Uuid>,
    Json(payload): Json<EvaluateTransitionRequest>,
) -> Json<TransitionResult> {
    let Some(workflow) = WorkflowType::parse(&payload.current_workflow) else {
        return Json(TransitionResult::no_transition());
    };
    let Some(current_stage) = PipelineStage::parse(&payload.current_stage) else {
        return Json(TransitionResult::no_transition());
    };

    let now = Utc::now();

    let stored = match sqlx::query_as::<_, (DateTime<Utc>, Option<DateTime<Utc>>)>(
        "SELECT created_at, last_activity_at FROM leads WHERE id = $1",
    )
    .bind(lead_id)
    .fetch_optional(&state.db_pool)
    .await
    {
        Ok(row) => row,
        Err(e) => {
            tracing::warn!(
                "Evaluating lead {} from the request alone, lookup failed: {}",
                lead_id,
                e
            );
            None
        }
    };

    // An unknown lead degrades to the request's own numbers: its age is taken
    // to be the claimed days in stage.
    let (created_at, last_activity_at) =
        stored.unwrap_or((now - Duration::days(payload.days_in_stage), None));
    let profile = ActivityProfile::derive(
        payload.last_activity_date.or(last_activity_at),
        created_at,
        state.config.engagement_window_days,
        now,
    );

    let ctx = LeadTransitionContext {
        workflow,
        current_stage,
        days_in_stage: payload.days_in_stage,
        has_engagement: profile.has_engagement,
        conversion_probability: payload.conversion_probability,
        days_since_last_activity: profile.days_since_last_activity,
    };

    Json(pipeline::evaluate(&state.rules, &ctx))
}
