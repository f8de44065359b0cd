//! Persistence: the opaque durable key-value service and the bridge that
//! round-trips timer state through it and through per-tab session storage.

pub mod file;

use std::collections::HashMap;

use anyhow::Result;
use serde_json::Value;
use tracing::{debug, warn};

use crate::host::SessionStore;
use crate::state::{DurationCatalog, ResetPolicy, SavedTimer, SessionTimer, TabId};

/// Durable storage key layout.
pub mod keys {
    pub const DURATIONS: &str = "durations";
    pub const DEFAULT_RESET_ON_INTERACTION: &str = "defaultResetOnInteraction";
    pub const PAGE_TIMERS: &str = "pageTimers";
}

/// Opaque durable key-value service. Values survive browser restarts; the
/// engine behind them is not this crate's concern.
pub trait KeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    async fn set(&self, key: &str, value: Value) -> Result<()>;
}

/// Round-trips timer state to per-tab session storage and to the durable
/// URL-keyed and configuration records.
#[derive(Debug)]
pub struct PersistenceBridge<K> {
    store: K,
}

impl<K: KeyValueStore> PersistenceBridge<K> {
    pub fn new(store: K) -> Self {
        Self { store }
    }

    /// Read a tab's session record. Read failures are not actionable and
    /// collapse to "no record".
    pub async fn read_session<S: SessionStore>(
        &self,
        sessions: &S,
        tab: TabId,
    ) -> Option<SessionTimer> {
        match sessions.session_get(tab).await {
            Ok(record) => record,
            Err(e) => {
                debug!("Could not read session record for tab {}: {:#}", tab, e);
                None
            }
        }
    }

    pub async fn write_session<S: SessionStore>(
        &self,
        sessions: &S,
        tab: TabId,
        record: &SessionTimer,
    ) -> Result<()> {
        sessions.session_set(tab, record).await
    }

    /// Clear a tab's session record. The tab may already be gone, so
    /// failures are swallowed.
    pub async fn clear_session<S: SessionStore>(&self, sessions: &S, tab: TabId) {
        if let Err(e) = sessions.session_remove(tab).await {
            debug!("Could not clear session record for tab {}: {:#}", tab, e);
        }
    }

    /// Load the duration catalog, replacing anything invalid with the
    /// built-in defaults.
    pub async fn load_catalog(&self) -> DurationCatalog {
        match self.store.get(keys::DURATIONS).await {
            Ok(Some(value)) => match serde_json::from_value::<Vec<i64>>(value) {
                Ok(list) => DurationCatalog::validated(&list),
                Err(e) => {
                    warn!("Stored duration list is not a number array ({}), using defaults", e);
                    DurationCatalog::default()
                }
            },
            Ok(None) => DurationCatalog::default(),
            Err(e) => {
                warn!("Could not load duration list: {:#}", e);
                DurationCatalog::default()
            }
        }
    }

    pub async fn save_catalog(&self, catalog: &DurationCatalog) -> Result<()> {
        self.store
            .set(keys::DURATIONS, serde_json::json!(catalog.durations()))
            .await
    }

    pub async fn load_default_policy(&self) -> ResetPolicy {
        match self.store.get(keys::DEFAULT_RESET_ON_INTERACTION).await {
            Ok(Some(value)) => serde_json::from_value(value).unwrap_or_else(|e| {
                warn!("Stored default interaction policy is invalid ({}), using none", e);
                ResetPolicy::None
            }),
            Ok(None) => ResetPolicy::None,
            Err(e) => {
                warn!("Could not load default interaction policy: {:#}", e);
                ResetPolicy::None
            }
        }
    }

    pub async fn save_default_policy(&self, policy: ResetPolicy) -> Result<()> {
        self.store
            .set(keys::DEFAULT_RESET_ON_INTERACTION, serde_json::json!(policy))
            .await
    }

    /// Load the URL-keyed saved timers. Invalid stored data collapses to an
    /// empty map.
    pub async fn load_saved_timers(&self) -> HashMap<String, SavedTimer> {
        match self.store.get(keys::PAGE_TIMERS).await {
            Ok(Some(value)) => serde_json::from_value(value).unwrap_or_else(|e| {
                warn!("Stored URL timers are invalid ({}), starting empty", e);
                HashMap::new()
            }),
            Ok(None) => HashMap::new(),
            Err(e) => {
                warn!("Could not load saved URL timers: {:#}", e);
                HashMap::new()
            }
        }
    }

    pub async fn save_saved_timers(&self, timers: &HashMap<String, SavedTimer>) -> Result<()> {
        self.store
            .set(keys::PAGE_TIMERS, serde_json::to_value(timers)?)
            .await
    }
}
