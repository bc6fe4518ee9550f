use axum::{
    http::Method,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod database;
mod error;
mod handlers;
mod jobs;
mod pipeline;
mod services;

pub use error::{ApiError, ApiResult, AppError};

#[cfg(test)]
mod tests;

pub struct AppState {
    pub db_pool: sqlx::PgPool,
    pub config: config::Config,
    pub rules: Arc<pipeline::RuleTable>,
    pub executor: pipeline::TransitionExecutor,
    pub runner: pipeline::TransitionRunner,
    pub activity: services::ActivityService,
    pub scheduler: Arc<jobs::JobScheduler>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::from_env()?;
    let db_pool = database::create_pool(&config.database_url).await?;

    database::migrate(&db_pool).await?;

    let rules = Arc::new(match &config.rules_path {
        Some(path) => pipeline::RuleTable::from_json_file(path)?,
        None => pipeline::RuleTable::standard(),
    });
    tracing::info!("Loaded transition rules for {} workflows", rules.workflow_count());

    let activity = services::ActivityService::new(db_pool.clone());
    let executor =
        pipeline::TransitionExecutor::new(db_pool.clone(), activity.clone(), config.fallback);
    let runner = pipeline::TransitionRunner::new(
        db_pool.clone(),
        rules.clone(),
        executor.clone(),
        config.engagement_window_days,
    );

    let scheduler =
        Arc::new(jobs::JobScheduler::new(runner.clone(), config.transition_cron.clone()).await?);
    scheduler.start().await?;

    let server_addr = config.server_addr.clone();
    let app_state = Arc::new(AppState {
        db_pool,
        config,
        rules,
        executor,
        runner,
        activity,
        scheduler: scheduler.clone(),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(|| async { "Cadence CRM API v1.0.0" }))
        .route("/health", get(handlers::health_check))
        .route("/api/jobs/executions", get(handlers::list_job_executions))
        .nest("/api/leads", handlers::lead_routes())
        .nest("/api/low-conversion", handlers::low_conversion_routes())
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(&server_addr).await?;
    tracing::info!("Server running on {}", server_addr);

    axum::serve(listener, app).await?;

    scheduler.shutdown().await?;

    Ok(())
}
