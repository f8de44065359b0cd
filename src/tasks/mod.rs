//! Background tasks module
//!
//! This module contains background tasks that run alongside the orchestrator.

pub mod reload;

// Re-export main functions
pub use reload::{spawn_reload_interval, IntervalHandle};
