//! Context-menu synchronization, including the collaborator mirror

use std::collections::HashMap;

use tracing::{debug, info};

use crate::host::{Collaborator, SendOutcome, TabHost};
use crate::protocol::{CollaboratorRequest, MenuSpec};
use crate::state::DurationCatalog;
use crate::utils::format_duration;

/// Menu entry that opens the options surface.
pub const MENU_OPTIONS: &str = "reload-options";

/// Menu entry that turns auto-reload off for the clicked tab.
pub const MENU_OFF: &str = "reload-off";

/// Name announced to the collaborator in the registration handshake.
pub const EXTENSION_NAME: &str = "Tab Reloader";

/// Stable identifier for a duration entry.
pub fn duration_menu_id(seconds: u32) -> String {
    format!("reload-{}", seconds)
}

/// Rebuilds the tab context menu from the duration catalog and mirrors
/// create/clear operations into the optional collaborator extension.
///
/// The entry mapping is ephemeral; it is regenerated deterministically from
/// the catalog on every rebuild and never persisted.
#[derive(Debug, Default)]
pub struct MenuSynchronizer {
    entries: HashMap<String, u32>,
    registered: bool,
}

impl MenuSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Duration behind a menu entry id; `None` for the fixed entries and
    /// unknown ids.
    pub fn duration_for(&self, menu_id: &str) -> Option<u32> {
        self.entries.get(menu_id).copied()
    }

    /// (Re)send the registration handshake. Mirroring is enabled only while
    /// the last handshake succeeded; a failed or timed-out handshake
    /// disables it until the collaborator next announces readiness.
    pub async fn register<C: Collaborator>(&mut self, collaborator: &C) {
        let outcome = collaborator
            .send(&CollaboratorRequest::RegisterSelf {
                name: EXTENSION_NAME.to_string(),
            })
            .await;
        self.registered = outcome.responded();
        if self.registered {
            info!("Collaborator extension registered, menu mirroring enabled");
        } else {
            debug!("Collaborator extension not reachable, menu mirroring disabled");
        }
    }

    /// Clear all prior entries and recreate the menu in catalog order:
    /// "Options", "Off", then one entry per duration.
    pub async fn rebuild<H, C>(&mut self, host: &H, collaborator: &C, catalog: &DurationCatalog)
    where
        H: TabHost,
        C: Collaborator,
    {
        self.entries.clear();
        host.remove_all_menus();
        if self.registered {
            self.mirror(collaborator, &CollaboratorRequest::MenuRemoveAll).await;
        }

        self.add_entry(host, collaborator, MenuSpec::tab(MENU_OPTIONS, "Options")).await;
        self.add_entry(host, collaborator, MenuSpec::tab(MENU_OFF, "Off")).await;

        for &duration in catalog.durations() {
            let id = duration_menu_id(duration);
            self.add_entry(host, collaborator, MenuSpec::tab(&id, format_duration(duration)))
                .await;
            self.entries.insert(id, duration);
        }
    }

    async fn add_entry<H, C>(&self, host: &H, collaborator: &C, spec: MenuSpec)
    where
        H: TabHost,
        C: Collaborator,
    {
        host.create_menu(&spec);
        if self.registered {
            self.mirror(collaborator, &CollaboratorRequest::MenuCreate { params: spec })
                .await;
        }
    }

    /// Mirroring is skipped without failing the primary operation.
    async fn mirror<C: Collaborator>(&self, collaborator: &C, request: &CollaboratorRequest) {
        match collaborator.send(request).await {
            SendOutcome::Responded(_) => {}
            SendOutcome::TimedOut | SendOutcome::Unavailable => {
                debug!("Collaborator did not answer, menu mirror skipped");
            }
        }
    }
}
