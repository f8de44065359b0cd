//! API response structures

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::orchestrator::{StatusSnapshot, TabStatus};
use crate::state::ResetPolicy;

/// Status response combining the orchestrator snapshot with server metadata
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub tabs: Vec<TabStatus>,
    pub durations: Vec<u32>,
    pub default_reset_on_interaction: ResetPolicy,
    pub saved_urls: usize,
    pub collaborator_registered: bool,
    pub uptime: String,
    pub timestamp: DateTime<Utc>,
}

impl StatusResponse {
    pub fn new(snapshot: StatusSnapshot, uptime: String) -> Self {
        Self {
            tabs: snapshot.tabs,
            durations: snapshot.durations,
            default_reset_on_interaction: snapshot.default_reset_on_interaction,
            saved_urls: snapshot.saved_urls,
            collaborator_registered: snapshot.collaborator_registered,
            uptime,
            timestamp: Utc::now(),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
