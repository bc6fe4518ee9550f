use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::json;
use std::sync::Arc;

use crate::AppState;

pub mod leads;
pub mod low_conversion;

pub use leads::lead_routes;
pub use low_conversion::low_conversion_routes;

pub async fn list_job_executions(
    State(state): State<Arc<AppState>>,
) -> Json<Vec<crate::jobs::JobExecutionLog>> {
    Json(state.scheduler.get_execution_logs().await)
}

pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<serde_json::Value>) {
    let database = crate::database::health_check(&state.db_pool).await;
    let status = if database { "healthy" } else { "degraded" };

    (
        StatusCode::OK,
        Json(json!({
            "status": status,
            "service": "cadence-api",
            "database": database,
        })),
    )
}
