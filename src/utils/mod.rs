//! Utility functions module
//!
//! This module contains utility functions used throughout the application.

pub mod signals;
pub mod time;
pub mod url;

// Re-export main functions
pub use signals::shutdown_signal;
pub use time::format_duration;
pub use url::normalize_url;
