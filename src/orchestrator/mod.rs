//! The tab-timer orchestrator
//!
//! Owns the mapping from browser tabs to active reload timers, persists and
//! restores it, keeps the selection menu in sync and reacts to
//! page-interaction signals. Events are processed one at a time, in arrival
//! order; every transition fully completes (including its persisted write)
//! before the next event is taken, so no two transitions for the same tab
//! ever run concurrently.


use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::host::{Collaborator, SessionStore, TabHost};
use crate::interaction::InteractionResetController;
use crate::menu::{MenuSynchronizer, EXTENSION_NAME, MENU_OPTIONS};
use crate::protocol::{Message, Reply};
use crate::state::{
    DurationCatalog, ResetPolicy, SavedTimer, TabId, TabTimerStore, TimerUpdate,
};
use crate::storage::{KeyValueStore, PersistenceBridge};
use crate::tasks::spawn_reload_interval;
use crate::utils::{format_duration, normalize_url};

/// Everything the orchestrator reacts to, in arrival order.
#[derive(Debug)]
pub enum Event {
    /// A native or collaborator-mirrored menu click.
    MenuClicked { menu_id: String, tab: TabId },
    TabCreated(TabId),
    TabUpdated(TabId),
    TabRemoved(TabId),
    /// The collaborator extension announced readiness.
    CollaboratorReady,
    /// A protocol message from a popup, options or content surface.
    Message {
        message: Message,
        sender_tab: Option<TabId>,
        reply: Option<oneshot::Sender<Reply>>,
    },
    /// Delayed second restore pass after startup.
    RestorePass,
    /// Point-in-time state query for the status surface.
    StatusSnapshot(oneshot::Sender<StatusSnapshot>),
}

/// Snapshot of orchestrator state for the status surface.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub tabs: Vec<TabStatus>,
    pub durations: Vec<u32>,
    pub default_reset_on_interaction: ResetPolicy,
    pub saved_urls: usize,
    pub collaborator_registered: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TabStatus {
    pub tab_id: TabId,
    pub duration: Option<u32>,
    pub reset_on_interaction: ResetPolicy,
}

/// The stateful core tying store, persistence, menu and interaction control
/// together. Constructed once at process start; handlers receive it
/// explicitly rather than reaching for globals.
pub struct Orchestrator<H, C, K> {
    host: H,
    collaborator: C,
    bridge: PersistenceBridge<K>,
    tabs: TabTimerStore,
    catalog: DurationCatalog,
    saved: HashMap<String, SavedTimer>,
    menu: MenuSynchronizer,
    interaction: InteractionResetController,
    restore_delay: Duration,
}

impl<H, C, K> Orchestrator<H, C, K>
where
    H: TabHost + SessionStore + Clone + Send + 'static,
    C: Collaborator,
    K: KeyValueStore,
{
    pub fn new(
        host: H,
        collaborator: C,
        bridge: PersistenceBridge<K>,
        restore_delay: Duration,
    ) -> Self {
        Self {
            host,
            collaborator,
            bridge,
            tabs: TabTimerStore::new(ResetPolicy::None),
            catalog: DurationCatalog::default(),
            saved: HashMap::new(),
            menu: MenuSynchronizer::new(),
            interaction: InteractionResetController,
            restore_delay,
        }
    }

    /// Bring the orchestrator up in a fixed order: load configuration,
    /// restore timers for tabs that are already open, schedule the delayed
    /// second restore pass, register the collaborator, build the menu.
    /// Event processing begins when [`run`](Self::run) is called.
    pub async fn init(&mut self, events: &mpsc::Sender<Event>) {
        let default_policy = self.bridge.load_default_policy().await;
        self.tabs.set_default_policy(default_policy);
        self.saved = self.bridge.load_saved_timers().await;
        self.catalog = self.bridge.load_catalog().await;
        info!(
            "Loaded {} durations and {} saved URL timers",
            self.catalog.durations().len(),
            self.saved.len()
        );

        self.restore_all().await;

        // Session values are not always readable right after a browser
        // restart; a second pass catches the stragglers.
        let events = events.clone();
        let delay = self.restore_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if events.send(Event::RestorePass).await.is_err() {
                debug!("Orchestrator gone before the second restore pass");
            }
        });

        self.menu.register(&self.collaborator).await;
        self.menu
            .rebuild(&self.host, &self.collaborator, &self.catalog)
            .await;
    }

    /// Process events one at a time until the channel closes.
    pub async fn run(mut self, mut events: mpsc::Receiver<Event>) {
        info!("Orchestrator event loop started");
        while let Some(event) = events.recv().await {
            self.handle(event).await;
        }
        info!("Orchestrator event loop stopped");
    }

    pub async fn handle(&mut self, event: Event) {
        debug!("Handling event: {:?}", event);
        match event {
            Event::MenuClicked { menu_id, tab } => self.menu_clicked(&menu_id, tab).await,
            Event::TabCreated(tab) => self.restore_timer(tab).await,
            Event::TabUpdated(tab) => self.tab_updated(tab).await,
            Event::TabRemoved(tab) => self.unregister_tab(tab).await,
            Event::CollaboratorReady => {
                self.menu.register(&self.collaborator).await;
                self.menu
                    .rebuild(&self.host, &self.collaborator, &self.catalog)
                    .await;
            }
            Event::Message {
                message,
                sender_tab,
                reply,
            } => self.on_message(message, sender_tab, reply).await,
            Event::RestorePass => self.restore_all().await,
            Event::StatusSnapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    async fn on_message(
        &mut self,
        message: Message,
        sender_tab: Option<TabId>,
        reply: Option<oneshot::Sender<Reply>>,
    ) {
        match message {
            Message::SetRefreshInterval { tab_id, duration } => {
                self.set_refresh_interval(tab_id, duration, None).await;
            }
            Message::GetTabResetOnInteraction { tab_id } => {
                let policy = self
                    .tabs
                    .get(tab_id)
                    .map(|entry| entry.reset_on_interaction)
                    .unwrap_or_else(|| self.tabs.default_policy());
                respond(reply, Reply::Policy(policy));
            }
            Message::SetTabRefreshOnInteraction {
                tab_id,
                reset_on_interaction,
            } => {
                self.set_tab_reset_policy(tab_id, reset_on_interaction).await;
            }
            Message::GetSavedTimerForUrl { url } => {
                let saved = self.saved.get(&normalize_url(&url)).copied();
                respond(reply, Reply::SavedTimer(saved));
            }
            Message::SaveTimer { tab_id, url } => self.save_timer(tab_id, &url).await,
            Message::RemoveSavedTimer { url } => self.remove_saved_timer(&url).await,
            Message::PageInteraction => match sender_tab {
                Some(tab) => self.page_interaction(tab).await,
                None => debug!("Interaction message without a sender tab, ignoring"),
            },
            Message::GetDefaultResetOnInteraction => {
                respond(reply, Reply::Policy(self.tabs.default_policy()));
            }
            Message::SaveDefaultResetOnInteraction {
                default_reset_on_interaction,
            } => {
                self.tabs.set_default_policy(default_reset_on_interaction);
                if let Err(e) = self
                    .bridge
                    .save_default_policy(default_reset_on_interaction)
                    .await
                {
                    warn!("Failed to persist default interaction policy: {:#}", e);
                }
            }
            Message::GetDurationList => {
                respond(reply, Reply::Durations(self.catalog.durations().to_vec()));
            }
            Message::SaveDurationList { durations } => {
                self.catalog = DurationCatalog::validated(&durations);
                self.menu
                    .rebuild(&self.host, &self.collaborator, &self.catalog)
                    .await;
                if let Err(e) = self.bridge.save_catalog(&self.catalog).await {
                    warn!("Failed to persist duration list: {:#}", e);
                }
            }
        }
    }

    async fn menu_clicked(&mut self, menu_id: &str, tab: TabId) {
        if menu_id == MENU_OPTIONS {
            self.host.open_options();
            return;
        }
        // "Off" and unknown entries both clear the timer
        let duration = self.menu.duration_for(menu_id);
        self.set_refresh_interval(tab, duration.map(i64::from), None)
            .await;
    }

    /// Select-duration transition. A falsy duration turns the tab off; any
    /// previous reload task is cancelled before a new one is installed.
    async fn set_refresh_interval(
        &mut self,
        tab: TabId,
        duration: Option<i64>,
        restored_policy: Option<ResetPolicy>,
    ) {
        self.tabs.cancel_interval(tab);
        let Some(duration) = duration.filter(|&d| d > 0).map(|d| d as u32) else {
            self.unregister_tab(tab).await;
            return;
        };

        let fresh = !self.tabs.is_registered(tab);
        if fresh {
            let policy = restored_policy.unwrap_or_else(|| self.tabs.default_policy());
            if policy.tracks_interaction() {
                self.interaction.attach(&self.host, tab);
            }
        }

        let interval = spawn_reload_interval(self.host.clone(), tab, duration);
        // An existing registration keeps its interaction policy; only a
        // fresh one takes the explicit or default policy.
        let update = TimerUpdate {
            interval: Some(interval),
            duration: Some(duration),
            reset_on_interaction: if fresh { restored_policy } else { None },
        };
        self.tabs.set(&self.host, &self.bridge, tab, update).await;

        info!("Tab {} now reloading every {}", tab, format_duration(duration));
        self.host.show_status(tab, &status_title(duration));
    }

    /// Off transition. Releases the reload task, the interaction listener
    /// and the persisted record; a second call is a no-op.
    async fn unregister_tab(&mut self, tab: TabId) {
        if !self.tabs.delete(&self.host, &self.bridge, tab).await {
            return;
        }
        self.interaction.detach(&self.host, tab);
        self.host.clear_status(tab);
        info!("Tab {} auto-reload turned off", tab);
    }

    async fn tab_updated(&mut self, tab: TabId) {
        // Navigation resets the visible status and destroys injected
        // listeners, so both are re-applied for active tabs
        if let Some(entry) = self.tabs.get(tab) {
            if let Some(duration) = entry.duration {
                self.host.show_status(tab, &status_title(duration));
            }
            if entry.reset_on_interaction.tracks_interaction() {
                self.interaction.attach(&self.host, tab);
            }
        } else {
            self.restore_timer(tab).await;
        }
    }

    async fn page_interaction(&mut self, tab: TabId) {
        // A stale notification for an unregistered tab is a no-op, not an
        // error: the tab may have been unregistered after the listener fired
        let Some(entry) = self.tabs.get(tab) else {
            debug!("Interaction for unregistered tab {}, ignoring", tab);
            return;
        };
        match entry.reset_on_interaction {
            ResetPolicy::Reset => self.reset_interval(tab).await,
            ResetPolicy::Cancel => self.unregister_tab(tab).await,
            ResetPolicy::None => {}
        }
    }

    /// Reinstall the periodic task with the unchanged duration, restarting
    /// the countdown.
    async fn reset_interval(&mut self, tab: TabId) {
        let Some(duration) = self.tabs.get(tab).and_then(|entry| entry.duration) else {
            return;
        };
        self.tabs.cancel_interval(tab);
        let interval = spawn_reload_interval(self.host.clone(), tab, duration);
        self.tabs
            .set(
                &self.host,
                &self.bridge,
                tab,
                TimerUpdate {
                    interval: Some(interval),
                    ..TimerUpdate::default()
                },
            )
            .await;
        debug!("Reset reload countdown for tab {}", tab);
    }

    async fn set_tab_reset_policy(&mut self, tab: TabId, policy: ResetPolicy) {
        if policy.tracks_interaction() {
            let current = self
                .tabs
                .get(tab)
                .map(|entry| entry.reset_on_interaction)
                .unwrap_or(ResetPolicy::None);
            if !current.tracks_interaction() {
                self.interaction.attach(&self.host, tab);
            }
        } else {
            self.interaction.detach(&self.host, tab);
        }
        self.tabs
            .set(
                &self.host,
                &self.bridge,
                tab,
                TimerUpdate {
                    reset_on_interaction: Some(policy),
                    ..TimerUpdate::default()
                },
            )
            .await;
    }

    async fn save_timer(&mut self, tab: TabId, url: &str) {
        let Some((duration, policy)) = self
            .tabs
            .get(tab)
            .and_then(|entry| entry.duration.map(|d| (d, entry.reset_on_interaction)))
        else {
            warn!("Save requested for tab {} with no active timer, ignoring", tab);
            return;
        };
        let key = normalize_url(url);
        info!("Saving timer for {} ({})", key, format_duration(duration));
        self.saved.insert(
            key,
            SavedTimer {
                duration,
                reset_on_interaction: policy,
            },
        );
        if let Err(e) = self.bridge.save_saved_timers(&self.saved).await {
            warn!("Failed to persist saved URL timers: {:#}", e);
        }
    }

    async fn remove_saved_timer(&mut self, url: &str) {
        if self.saved.remove(&normalize_url(url)).is_some() {
            if let Err(e) = self.bridge.save_saved_timers(&self.saved).await {
                warn!("Failed to persist saved URL timers: {:#}", e);
            }
        }
    }

    /// Restore a single tab, preferring its session record over the
    /// URL-keyed saved timer. Already-registered tabs are skipped so
    /// overlapping restore passes cannot double-register.
    async fn restore_timer(&mut self, tab: TabId) {
        if self.tabs.is_registered(tab) {
            return;
        }
        let record = match self.bridge.read_session(&self.host, tab).await {
            Some(session) => Some((session.duration, session.reset_on_interaction)),
            None => match self.host.tab_url(tab).await {
                Ok(url) => self
                    .saved
                    .get(&normalize_url(&url))
                    .map(|saved| (Some(saved.duration), saved.reset_on_interaction)),
                Err(e) => {
                    debug!("Could not read URL for tab {}: {:#}", tab, e);
                    None
                }
            },
        };
        if let Some((duration, policy)) = record {
            if duration.is_some_and(|d| d > 0) {
                self.set_refresh_interval(tab, duration.map(i64::from), Some(policy))
                    .await;
            }
        }
    }

    /// Restore every currently open tab. Idempotent across passes.
    async fn restore_all(&mut self) {
        let tabs = match self.host.all_tabs().await {
            Ok(tabs) => tabs,
            Err(e) => {
                warn!("Could not enumerate open tabs: {:#}", e);
                return;
            }
        };
        debug!("Restore pass over {} tabs", tabs.len());
        for tab in tabs {
            self.restore_timer(tab).await;
        }
    }

    fn snapshot(&self) -> StatusSnapshot {
        let mut tabs: Vec<TabStatus> = self
            .tabs
            .iter()
            .map(|(&tab_id, entry)| TabStatus {
                tab_id,
                duration: entry.duration,
                reset_on_interaction: entry.reset_on_interaction,
            })
            .collect();
        tabs.sort_by_key(|status| status.tab_id);
        StatusSnapshot {
            tabs,
            durations: self.catalog.durations().to_vec(),
            default_reset_on_interaction: self.tabs.default_policy(),
            saved_urls: self.saved.len(),
            collaborator_registered: self.menu.is_registered(),
        }
    }
}

fn status_title(duration: u32) -> String {
    format!("{} ({})", EXTENSION_NAME, format_duration(duration))
}

fn respond(reply: Option<oneshot::Sender<Reply>>, value: Reply) {
    if let Some(tx) = reply {
        if tx.send(value).is_err() {
            debug!("Reply channel closed before the response was sent");
        }
    }
}
