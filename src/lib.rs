//! Tab Reloader - a state-managed daemon for automatic browser tab reloading
//!
//! This library provides the tab-timer orchestrator: it owns the mapping
//! from browser tabs to active reload timers, persists and restores that
//! mapping, mirrors the selection menu into an optional collaborator
//! extension and resets or cancels timers on page interaction.

#![allow(async_fn_in_trait)]

pub mod api;
pub mod config;
pub mod host;
pub mod interaction;
pub mod menu;
pub mod orchestrator;
pub mod protocol;
pub mod state;
pub mod storage;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use orchestrator::{Event, Orchestrator};
pub use state::{ResetPolicy, TabId};
pub use utils::signals::shutdown_signal;
