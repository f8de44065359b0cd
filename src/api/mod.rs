//! HTTP status surface
//!
//! A small observability surface for the daemon; the extension protocol
//! itself travels over the stdio bridge, not HTTP.

pub mod handlers;
pub mod responses;

use std::time::Instant;

use axum::{routing::get, Router};
use tokio::sync::mpsc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::orchestrator::Event;
use handlers::*;

/// Shared state for the status handlers.
#[derive(Clone)]
pub struct ApiState {
    pub events: mpsc::Sender<Event>,
    pub start_time: Instant,
}

impl ApiState {
    pub fn new(events: mpsc::Sender<Event>) -> Self {
        Self {
            events,
            start_time: Instant::now(),
        }
    }

    /// Server uptime as a formatted string
    pub fn uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}

/// Create the HTTP router with all endpoints
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
