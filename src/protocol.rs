//! Typed message protocol between UI surfaces, content scripts, the
//! collaborator extension and the orchestrator.
//!
//! Each message kind is a closed enum variant, so the dispatcher is
//! exhaustive and adding a kind is a compile-time-checked change. Wire tags
//! and payload field names follow the established extension protocol
//! (kebab-case tags, camelCase fields).

use serde::{Deserialize, Serialize};

use crate::state::{ResetPolicy, SavedTimer, TabId};

/// Messages consumed by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    /// Select a reload interval for a tab. A missing or non-positive
    /// duration turns auto-reload off.
    #[serde(rename = "set-refresh-interval", rename_all = "camelCase")]
    SetRefreshInterval {
        tab_id: TabId,
        duration: Option<i64>,
    },

    #[serde(rename = "get-tab-reset-on-interaction", rename_all = "camelCase")]
    GetTabResetOnInteraction { tab_id: TabId },

    #[serde(rename = "set-tab-refresh-on-interaction", rename_all = "camelCase")]
    SetTabRefreshOnInteraction {
        tab_id: TabId,
        #[serde(default)]
        reset_on_interaction: ResetPolicy,
    },

    #[serde(rename = "get-saved-timer-for-url")]
    GetSavedTimerForUrl { url: String },

    /// Persist the sending tab's current timer under its URL.
    #[serde(rename = "save-timer", rename_all = "camelCase")]
    SaveTimer { tab_id: TabId, url: String },

    #[serde(rename = "remove-saved-timer")]
    RemoveSavedTimer { url: String },

    /// Sent by the content-script listener; the sender tab is carried by the
    /// transport, not the payload.
    #[serde(rename = "page-interaction")]
    PageInteraction,

    #[serde(rename = "get-default-reset-on-interaction")]
    GetDefaultResetOnInteraction,

    #[serde(rename = "save-default-reset-on-interaction", rename_all = "camelCase")]
    SaveDefaultResetOnInteraction {
        #[serde(default)]
        default_reset_on_interaction: ResetPolicy,
    },

    #[serde(rename = "get-duration-list")]
    GetDurationList,

    #[serde(rename = "save-duration-list")]
    SaveDurationList { durations: Vec<i64> },
}

/// Replies to the read-only message kinds, serialized as the bare value the
/// asking surface expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Policy(ResetPolicy),
    SavedTimer(Option<SavedTimer>),
    Durations(Vec<u32>),
}

/// Outbound messages to the optional collaborator extension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CollaboratorRequest {
    #[serde(rename = "register-self")]
    RegisterSelf { name: String },

    #[serde(rename = "fake-contextMenu-create")]
    MenuCreate { params: MenuSpec },

    #[serde(rename = "fake-contextMenu-remove-all")]
    MenuRemoveAll,
}

/// Parameters for one context-menu entry, shared by the native menu and the
/// collaborator mirror.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuSpec {
    pub id: String,
    pub title: String,
    pub contexts: Vec<String>,
}

impl MenuSpec {
    /// A tab-context entry.
    pub fn tab(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            contexts: vec!["tab".to_string()],
        }
    }
}
