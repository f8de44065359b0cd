//! In-memory test doubles for the host traits and the durable store

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use serde_json::Value;

use crate::protocol::{CollaboratorRequest, MenuSpec};
use crate::state::{SessionTimer, TabId};
use crate::storage::KeyValueStore;

use super::{Collaborator, SendOutcome, SessionStore, TabHost};

/// A recorded fire-and-forget host call.
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    Reload(TabId),
    ShowStatus(TabId, String),
    ClearStatus(TabId),
    InjectListener(TabId),
    CancelListener(TabId),
    OpenOptions,
    MenuCreate(String),
    MenuRemoveAll,
}

/// Recording browser double with an in-memory session store.
#[derive(Clone, Default)]
pub struct MockHost {
    calls: Arc<Mutex<Vec<HostCall>>>,
    sessions: Arc<Mutex<HashMap<TabId, SessionTimer>>>,
    urls: Arc<Mutex<HashMap<TabId, String>>>,
    open_tabs: Arc<Mutex<Vec<TabId>>>,
    fail_session_writes: Arc<AtomicBool>,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn count(&self, call: &HostCall) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    pub fn reload_count(&self, tab: TabId) -> usize {
        self.count(&HostCall::Reload(tab))
    }

    pub fn session(&self, tab: TabId) -> Option<SessionTimer> {
        self.sessions.lock().unwrap().get(&tab).cloned()
    }

    pub fn seed_session(&self, tab: TabId, record: SessionTimer) {
        self.sessions.lock().unwrap().insert(tab, record);
    }

    pub fn seed_url(&self, tab: TabId, url: &str) {
        self.urls.lock().unwrap().insert(tab, url.to_string());
    }

    pub fn seed_open_tabs(&self, tabs: &[TabId]) {
        *self.open_tabs.lock().unwrap() = tabs.to_vec();
    }

    pub fn fail_session_writes(&self) {
        self.fail_session_writes.store(true, Ordering::SeqCst);
    }

    fn record(&self, call: HostCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl TabHost for MockHost {
    fn reload(&self, tab: TabId) {
        self.record(HostCall::Reload(tab));
    }

    fn show_status(&self, tab: TabId, title: &str) {
        self.record(HostCall::ShowStatus(tab, title.to_string()));
    }

    fn clear_status(&self, tab: TabId) {
        self.record(HostCall::ClearStatus(tab));
    }

    fn inject_interaction_listener(&self, tab: TabId) {
        self.record(HostCall::InjectListener(tab));
    }

    fn cancel_interaction_listener(&self, tab: TabId) {
        self.record(HostCall::CancelListener(tab));
    }

    fn open_options(&self) {
        self.record(HostCall::OpenOptions);
    }

    fn create_menu(&self, spec: &MenuSpec) {
        self.record(HostCall::MenuCreate(spec.id.clone()));
    }

    fn remove_all_menus(&self) {
        self.record(HostCall::MenuRemoveAll);
    }

    async fn tab_url(&self, tab: TabId) -> Result<String> {
        self.urls
            .lock()
            .unwrap()
            .get(&tab)
            .cloned()
            .ok_or_else(|| anyhow!("no such tab: {}", tab))
    }

    async fn all_tabs(&self) -> Result<Vec<TabId>> {
        Ok(self.open_tabs.lock().unwrap().clone())
    }
}

impl SessionStore for MockHost {
    async fn session_get(&self, tab: TabId) -> Result<Option<SessionTimer>> {
        Ok(self.sessions.lock().unwrap().get(&tab).cloned())
    }

    async fn session_set(&self, tab: TabId, record: &SessionTimer) -> Result<()> {
        if self.fail_session_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("session storage unavailable"));
        }
        self.sessions.lock().unwrap().insert(tab, record.clone());
        Ok(())
    }

    async fn session_remove(&self, tab: TabId) -> Result<()> {
        match self.sessions.lock().unwrap().remove(&tab) {
            Some(_) => Ok(()),
            None => Err(anyhow!("no session value for tab {}", tab)),
        }
    }
}

/// Scripted collaborator double.
#[derive(Clone)]
pub struct MockCollaborator {
    sent: Arc<Mutex<Vec<CollaboratorRequest>>>,
    respond: Arc<AtomicBool>,
}

impl Default for MockCollaborator {
    fn default() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            respond: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl MockCollaborator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A collaborator that never answers; sends resolve as timed out.
    pub fn unresponsive() -> Self {
        let collaborator = Self::default();
        collaborator.respond.store(false, Ordering::SeqCst);
        collaborator
    }

    pub fn set_responsive(&self, responsive: bool) {
        self.respond.store(responsive, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<CollaboratorRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn clear_sent(&self) {
        self.sent.lock().unwrap().clear();
    }
}

impl Collaborator for MockCollaborator {
    async fn send(&self, message: &CollaboratorRequest) -> SendOutcome {
        self.sent.lock().unwrap().push(message.clone());
        if self.respond.load(Ordering::SeqCst) {
            SendOutcome::Responded(Value::Bool(true))
        } else {
            SendOutcome::TimedOut
        }
    }
}

/// In-memory durable store double.
#[derive(Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, Value>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn insert(&self, key: &str, value: Value) {
        self.values.lock().unwrap().insert(key.to_string(), value);
    }

    pub fn value(&self, key: &str) -> Option<Value> {
        self.values.lock().unwrap().get(key).cloned()
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("durable storage unavailable"));
        }
        self.values.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }
}
