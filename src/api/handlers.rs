//! HTTP endpoint handlers

use std::time::Duration;

use axum::{extract::State, http::StatusCode, response::Json};
use tokio::sync::oneshot;
use tracing::error;

use crate::orchestrator::Event;

use super::responses::{HealthResponse, StatusResponse};
use super::ApiState;

/// Deadline for the orchestrator to answer a snapshot query.
const SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(2);

/// Handle GET /status - Return active timers and configuration
pub async fn status_handler(State(state): State<ApiState>) -> Result<Json<StatusResponse>, StatusCode> {
    let (tx, rx) = oneshot::channel();
    if state.events.send(Event::StatusSnapshot(tx)).await.is_err() {
        error!("Orchestrator is gone, cannot answer status query");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    match tokio::time::timeout(SNAPSHOT_TIMEOUT, rx).await {
        Ok(Ok(snapshot)) => Ok(Json(StatusResponse::new(snapshot, state.uptime()))),
        _ => {
            error!("Status snapshot query timed out");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
