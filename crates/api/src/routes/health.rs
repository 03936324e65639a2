use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::state::AppState;

/// Create health router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness_check))
        .route("/health/live", get(liveness_check))
        .route("/version", get(version_info))
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub version: &'static str,
    pub uptime_seconds: i64,
}

#[derive(Debug, Serialize)]
pub struct ReadinessStatus {
    pub is_ready: bool,
    pub storage: &'static str,
    pub timestamp: DateTime<Utc>,
}

fn uptime(state: &AppState) -> i64 {
    (Utc::now() - state.started_at).num_seconds()
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy",
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: uptime(&state),
    })
}

/// Readiness check endpoint: the storage backend must answer
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<ReadinessStatus>, (StatusCode, Json<ReadinessStatus>)> {
    match state.storage.ping().await {
        Ok(()) => Ok(Json(ReadinessStatus {
            is_ready: true,
            storage: "ok",
            timestamp: Utc::now(),
        })),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessStatus {
                    is_ready: false,
                    storage: "unreachable",
                    timestamp: Utc::now(),
                }),
            ))
        }
    }
}

/// Liveness check endpoint
pub async fn liveness_check(State(state): State<AppState>) -> Json<Value> {
    Json(serde_json::json!({
        "status": "alive",
        "timestamp": Utc::now(),
        "uptime_seconds": uptime(&state),
    }))
}

/// Version info endpoint
pub async fn version_info(State(state): State<AppState>) -> Json<Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "git_commit": option_env!("GIT_COMMIT").unwrap_or("unknown"),
        "congress": state.config.congress.name,
        "environment": state.config.environment.to_string(),
    }))
}
