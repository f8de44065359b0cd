//! Page-interaction listener control

use tracing::debug;

use crate::host::TabHost;
use crate::state::TabId;

/// Attaches and detaches the per-tab interaction listener.
///
/// Both operations are best-effort requests to the content-script
/// collaborator. The controller never learns whether a listener is actually
/// installed; it relies on idempotent attach/detach semantics, so attaching
/// twice or detaching an absent listener is harmless.
#[derive(Debug, Default, Clone, Copy)]
pub struct InteractionResetController;

impl InteractionResetController {
    /// Request the all-frames interaction listener for a tab.
    pub fn attach<H: TabHost>(&self, host: &H, tab: TabId) {
        debug!("Requesting interaction listener for tab {}", tab);
        host.inject_interaction_listener(tab);
    }

    /// Request removal of the tab's interaction listener.
    pub fn detach<H: TabHost>(&self, host: &H, tab: TabId) {
        debug!("Cancelling interaction listener for tab {}", tab);
        host.cancel_interaction_listener(tab);
    }
}
