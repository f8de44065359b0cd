//! In-process table of active tab timers
//!
//! Single source of truth for "is this tab auto-reloading and with what
//! policy". Every mutation writes the session record through the
//! persistence bridge so the in-memory table and the persisted record never
//! diverge; if a write fails the in-memory entry stays authoritative for
//! this session.

use std::collections::HashMap;

use tracing::warn;

use crate::host::SessionStore;
use crate::storage::{KeyValueStore, PersistenceBridge};

use super::entry::{merge_entry, ResetPolicy, TabId, TimerEntry, TimerUpdate};

#[derive(Debug, Default)]
pub struct TabTimerStore {
    tabs: HashMap<TabId, TimerEntry>,
    default_policy: ResetPolicy,
}

impl TabTimerStore {
    pub fn new(default_policy: ResetPolicy) -> Self {
        Self {
            tabs: HashMap::new(),
            default_policy,
        }
    }

    pub fn get(&self, tab: TabId) -> Option<&TimerEntry> {
        self.tabs.get(&tab)
    }

    pub fn is_registered(&self, tab: TabId) -> bool {
        self.tabs.contains_key(&tab)
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TabId, &TimerEntry)> {
        self.tabs.iter()
    }

    /// Process-wide policy applied when an update leaves the interaction
    /// policy unspecified on a fresh entry.
    pub fn default_policy(&self) -> ResetPolicy {
        self.default_policy
    }

    pub fn set_default_policy(&mut self, policy: ResetPolicy) {
        self.default_policy = policy;
    }

    /// Drop a tab's running reload task without unregistering the entry.
    pub fn cancel_interval(&mut self, tab: TabId) {
        if let Some(entry) = self.tabs.get_mut(&tab) {
            entry.cancel_interval();
        }
    }

    /// Merge `update` onto the tab's entry and write the session record
    /// through. A displaced reload task is cancelled by the merge.
    pub async fn set<S, K>(
        &mut self,
        sessions: &S,
        bridge: &PersistenceBridge<K>,
        tab: TabId,
        update: TimerUpdate,
    ) -> &TimerEntry
    where
        S: SessionStore,
        K: KeyValueStore,
    {
        let existing = self.tabs.remove(&tab);
        let merged = merge_entry(existing, update, self.default_policy);
        if let Err(e) = bridge
            .write_session(sessions, tab, &merged.session_record())
            .await
        {
            warn!("Failed to persist session record for tab {}: {:#}", tab, e);
        }
        self.tabs.entry(tab).or_insert(merged)
    }

    /// Cancel the tab's task, clear its persisted record and remove the
    /// entry. Returns whether an entry existed; a second call is a no-op.
    pub async fn delete<S, K>(
        &mut self,
        sessions: &S,
        bridge: &PersistenceBridge<K>,
        tab: TabId,
    ) -> bool
    where
        S: SessionStore,
        K: KeyValueStore,
    {
        match self.tabs.remove(&tab) {
            Some(entry) => {
                // Dropping the entry aborts its reload task
                drop(entry);
                bridge.clear_session(sessions, tab).await;
                true
            }
            None => false,
        }
    }
}
