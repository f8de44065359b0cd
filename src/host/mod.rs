//! Host-browser collaborator surface
//!
//! The orchestrator never talks to a browser directly; everything it needs
//! from the host goes through these traits. The shipped implementation is
//! the stdio bridge in [`stdio`]; tests substitute in-memory doubles.

pub mod stdio;

#[cfg(test)]
pub mod mock;

use anyhow::Result;

use crate::protocol::{CollaboratorRequest, MenuSpec};
use crate::state::{SessionTimer, TabId};

/// The browser surface the orchestrator drives.
///
/// Fire-and-forget methods are best-effort requests and never report
/// failure; the querying methods return errors the caller downgrades to
/// log-and-continue.
pub trait TabHost {
    /// Request a page reload. Fire-and-forget.
    fn reload(&self, tab: TabId);

    /// Show the visible auto-reload status for a tab.
    fn show_status(&self, tab: TabId, title: &str);

    /// Clear the visible auto-reload status for a tab.
    fn clear_status(&self, tab: TabId);

    /// Inject the all-frames interaction listener. Idempotent; a tab with no
    /// accessible document degrades silently.
    fn inject_interaction_listener(&self, tab: TabId);

    /// Ask the tab's content listener to remove itself. Idempotent.
    fn cancel_interaction_listener(&self, tab: TabId);

    /// Open the options surface.
    fn open_options(&self);

    /// Create one native context-menu entry.
    fn create_menu(&self, spec: &MenuSpec);

    /// Remove all native context-menu entries.
    fn remove_all_menus(&self);

    /// Current URL of a tab.
    async fn tab_url(&self, tab: TabId) -> Result<String>;

    /// All currently open tabs.
    async fn all_tabs(&self) -> Result<Vec<TabId>>;
}

/// Volatile per-tab session storage scoped to the tab's in-memory lifetime.
///
/// The host keeps each record under the fixed per-tab key `refresh`.
pub trait SessionStore {
    async fn session_get(&self, tab: TabId) -> Result<Option<SessionTimer>>;

    async fn session_set(&self, tab: TabId, record: &SessionTimer) -> Result<()>;

    async fn session_remove(&self, tab: TabId) -> Result<()>;
}

/// Outcome of a deadline-bounded collaborator round-trip. Always resolves;
/// a missing or slow collaborator never blocks the caller.
#[derive(Debug, Clone)]
pub enum SendOutcome {
    Responded(serde_json::Value),
    TimedOut,
    Unavailable,
}

impl SendOutcome {
    pub fn responded(&self) -> bool {
        matches!(self, SendOutcome::Responded(_))
    }
}

/// The optional external extension the context menu is mirrored into.
pub trait Collaborator {
    /// Send a message bounded by the configured deadline.
    async fn send(&self, message: &CollaboratorRequest) -> SendOutcome;
}
