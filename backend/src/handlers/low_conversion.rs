use axum::{extract::State, response::Json, routing::post, Router};
use std::sync::Arc;

use crate::pipeline::TransitionRunReport;
use crate::AppState;

pub fn low_conversion_routes() -> Router<Arc<AppState>> {
    Router::new().route("/run-transitions", post(run_transitions))
}

/// Evaluate and transition all eligible leads in bulk. Always answers with a
/// report; a failed run degrades to zero counts rather than an error.
async fn run_transitions(State(state): State<Arc<AppState>>) -> Json<TransitionRunReport> {
    Json(state.runner.run().await.report)
}
