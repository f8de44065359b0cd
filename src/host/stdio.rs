//! JSON-lines bridge to the in-browser relay
//!
//! The daemon drives the browser through single-line JSON command frames on
//! stdout and receives tab, menu and protocol-message events on stdin (the
//! channel a native-messaging relay speaks). Commands that need an answer
//! carry an `id`; the relay echoes it in a `response` frame. Collaborator
//! sends ride the same channel with the shorter, configurable deadline.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::orchestrator::Event;
use crate::protocol::{CollaboratorRequest, MenuSpec, Message};
use crate::state::{SessionTimer, TabId};

use super::{Collaborator, SendOutcome, SessionStore, TabHost};

/// Deadline for host round-trips other than collaborator sends.
const HOST_REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// Daemon -> relay command frames.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
enum Command {
    #[serde(rename = "reload")]
    Reload { tab: TabId },
    #[serde(rename = "show-status")]
    ShowStatus { tab: TabId, title: String },
    #[serde(rename = "clear-status")]
    ClearStatus { tab: TabId },
    #[serde(rename = "menu-create")]
    MenuCreate { params: MenuSpec },
    #[serde(rename = "menu-remove-all")]
    MenuRemoveAll,
    #[serde(rename = "inject-interaction-listener")]
    InjectInteractionListener { tab: TabId },
    /// Forwarded to the tab's content listener.
    #[serde(rename = "cancel-interaction-listener")]
    CancelInteractionListener { tab: TabId },
    #[serde(rename = "open-options")]
    OpenOptions,
    #[serde(rename = "session-set")]
    SessionSet {
        id: u64,
        tab: TabId,
        record: SessionTimer,
    },
    #[serde(rename = "session-get")]
    SessionGet { id: u64, tab: TabId },
    #[serde(rename = "session-remove")]
    SessionRemove { id: u64, tab: TabId },
    #[serde(rename = "tab-url")]
    TabUrl { id: u64, tab: TabId },
    #[serde(rename = "query-tabs")]
    QueryTabs { id: u64 },
    #[serde(rename = "collaborator-send")]
    CollaboratorSend { id: u64, message: CollaboratorRequest },
    /// Answer to an inbound `message` frame that asked for one.
    #[serde(rename = "reply")]
    Reply { id: u64, value: Value },
}

/// Relay -> daemon frames.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
enum Frame {
    #[serde(rename = "tab-created")]
    TabCreated { tab: TabId },
    #[serde(rename = "tab-updated")]
    TabUpdated { tab: TabId },
    #[serde(rename = "tab-removed")]
    TabRemoved { tab: TabId },
    #[serde(rename = "menu-clicked", rename_all = "camelCase")]
    MenuClicked { menu_id: String, tab: TabId },
    #[serde(rename = "collaborator-ready")]
    CollaboratorReady,
    /// The collaborator's mirrored menu was clicked.
    #[serde(rename = "collaborator-menu-click", rename_all = "camelCase")]
    CollaboratorMenuClick { menu_id: String, tab: TabId },
    #[serde(rename = "message", rename_all = "camelCase")]
    Message {
        message: Message,
        #[serde(default)]
        sender_tab: Option<TabId>,
        #[serde(default)]
        id: Option<u64>,
    },
    #[serde(rename = "response")]
    Response { id: u64, value: Value },
}

/// Browser host backed by the stdio relay. Cheap to clone; all clones share
/// the writer channel and the pending-request table.
#[derive(Debug, Clone)]
pub struct BridgeHost {
    commands: mpsc::UnboundedSender<Command>,
    pending: Arc<Mutex<HashMap<u64, oneshot::Sender<Value>>>>,
    next_id: Arc<AtomicU64>,
    collaborator_timeout: Duration,
}

impl BridgeHost {
    /// Spawn the stdin/stdout pumps and return the connected host.
    pub fn spawn(events: mpsc::Sender<Event>, collaborator_timeout: Duration) -> Self {
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let host = Self {
            commands,
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            collaborator_timeout,
        };
        tokio::spawn(write_commands(commands_rx));
        tokio::spawn(read_frames(events, host.clone()));
        host
    }

    fn send_command(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("Bridge writer is gone, dropping command");
        }
    }

    /// Send a command carrying a fresh id and wait for the matching
    /// `response` frame, bounded by `deadline`.
    async fn request(&self, make: impl FnOnce(u64) -> Command, deadline: Duration) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self
                .pending
                .lock()
                .map_err(|_| anyhow!("pending-request table poisoned"))?;
            pending.insert(id, tx);
        }
        self.send_command(make(id));
        match tokio::time::timeout(deadline, rx).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => Err(anyhow!("bridge closed before response to request {}", id)),
            Err(_) => {
                self.forget(id);
                Err(anyhow!("bridge request {} timed out", id))
            }
        }
    }

    fn forget(&self, id: u64) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.remove(&id);
        }
    }

    fn resolve(&self, id: u64, value: Value) {
        let waiter = match self.pending.lock() {
            Ok(mut pending) => pending.remove(&id),
            Err(_) => None,
        };
        match waiter {
            Some(tx) => {
                let _ = tx.send(value);
            }
            None => debug!("Response for unknown request {}", id),
        }
    }
}

impl TabHost for BridgeHost {
    fn reload(&self, tab: TabId) {
        self.send_command(Command::Reload { tab });
    }

    fn show_status(&self, tab: TabId, title: &str) {
        self.send_command(Command::ShowStatus {
            tab,
            title: title.to_string(),
        });
    }

    fn clear_status(&self, tab: TabId) {
        self.send_command(Command::ClearStatus { tab });
    }

    fn inject_interaction_listener(&self, tab: TabId) {
        self.send_command(Command::InjectInteractionListener { tab });
    }

    fn cancel_interaction_listener(&self, tab: TabId) {
        self.send_command(Command::CancelInteractionListener { tab });
    }

    fn open_options(&self) {
        self.send_command(Command::OpenOptions);
    }

    fn create_menu(&self, spec: &MenuSpec) {
        self.send_command(Command::MenuCreate {
            params: spec.clone(),
        });
    }

    fn remove_all_menus(&self) {
        self.send_command(Command::MenuRemoveAll);
    }

    async fn tab_url(&self, tab: TabId) -> Result<String> {
        let value = self
            .request(|id| Command::TabUrl { id, tab }, HOST_REQUEST_TIMEOUT)
            .await?;
        serde_json::from_value(value).context("relay returned a non-string tab URL")
    }

    async fn all_tabs(&self) -> Result<Vec<TabId>> {
        let value = self
            .request(|id| Command::QueryTabs { id }, HOST_REQUEST_TIMEOUT)
            .await?;
        serde_json::from_value(value).context("relay returned an invalid tab list")
    }
}

impl SessionStore for BridgeHost {
    async fn session_get(&self, tab: TabId) -> Result<Option<SessionTimer>> {
        let value = self
            .request(|id| Command::SessionGet { id, tab }, HOST_REQUEST_TIMEOUT)
            .await?;
        serde_json::from_value(value).context("relay returned an invalid session record")
    }

    async fn session_set(&self, tab: TabId, record: &SessionTimer) -> Result<()> {
        self.request(
            |id| Command::SessionSet {
                id,
                tab,
                record: record.clone(),
            },
            HOST_REQUEST_TIMEOUT,
        )
        .await?;
        Ok(())
    }

    async fn session_remove(&self, tab: TabId) -> Result<()> {
        self.request(|id| Command::SessionRemove { id, tab }, HOST_REQUEST_TIMEOUT)
            .await?;
        Ok(())
    }
}

impl Collaborator for BridgeHost {
    async fn send(&self, message: &CollaboratorRequest) -> SendOutcome {
        if self.commands.is_closed() {
            return SendOutcome::Unavailable;
        }
        match self
            .request(
                |id| Command::CollaboratorSend {
                    id,
                    message: message.clone(),
                },
                self.collaborator_timeout,
            )
            .await
        {
            Ok(value) => SendOutcome::Responded(value),
            // An absent collaborator simply never answers
            Err(_) => SendOutcome::TimedOut,
        }
    }
}

async fn write_commands(mut commands: mpsc::UnboundedReceiver<Command>) {
    let mut stdout = tokio::io::stdout();
    while let Some(command) = commands.recv().await {
        let mut line = match serde_json::to_vec(&command) {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to encode bridge command: {}", e);
                continue;
            }
        };
        line.push(b'\n');
        if let Err(e) = stdout.write_all(&line).await {
            error!("Bridge stdout write failed: {}", e);
            break;
        }
        if let Err(e) = stdout.flush().await {
            error!("Bridge stdout flush failed: {}", e);
            break;
        }
    }
}

async fn read_frames(events: mpsc::Sender<Event>, host: BridgeHost) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<Frame>(line) {
                    Ok(frame) => dispatch_frame(frame, &events, &host).await,
                    Err(e) => warn!("Ignoring malformed bridge frame: {}", e),
                }
            }
            Ok(None) => {
                info!("Bridge stdin closed");
                break;
            }
            Err(e) => {
                error!("Bridge stdin read failed: {}", e);
                break;
            }
        }
    }
}

async fn dispatch_frame(frame: Frame, events: &mpsc::Sender<Event>, host: &BridgeHost) {
    let event = match frame {
        Frame::TabCreated { tab } => Event::TabCreated(tab),
        Frame::TabUpdated { tab } => Event::TabUpdated(tab),
        Frame::TabRemoved { tab } => Event::TabRemoved(tab),
        Frame::MenuClicked { menu_id, tab } | Frame::CollaboratorMenuClick { menu_id, tab } => {
            Event::MenuClicked { menu_id, tab }
        }
        Frame::CollaboratorReady => Event::CollaboratorReady,
        Frame::Message {
            message,
            sender_tab,
            id,
        } => {
            // Route the orchestrator's reply back over stdout when the
            // surface asked for one
            let reply = id.map(|id| {
                let (tx, rx) = oneshot::channel();
                let host = host.clone();
                tokio::spawn(async move {
                    if let Ok(reply) = rx.await {
                        match serde_json::to_value(&reply) {
                            Ok(value) => host.send_command(Command::Reply { id, value }),
                            Err(e) => error!("Failed to encode reply: {}", e),
                        }
                    }
                });
                tx
            });
            Event::Message {
                message,
                sender_tab,
                reply,
            }
        }
        Frame::Response { id, value } => {
            host.resolve(id, value);
            return;
        }
    };
    if events.send(event).await.is_err() {
        debug!("Orchestrator gone, dropping bridge event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_command_frames_carry_kebab_tags() {
        let frame = serde_json::to_value(Command::Reload { tab: TabId(3) }).unwrap();
        assert_eq!(frame, json!({"type": "reload", "tab": 3}));

        let frame = serde_json::to_value(Command::CollaboratorSend {
            id: 9,
            message: CollaboratorRequest::MenuRemoveAll,
        })
        .unwrap();
        assert_eq!(frame["type"], "collaborator-send");
        assert_eq!(frame["message"]["type"], "fake-contextMenu-remove-all");
    }

    #[test]
    fn test_inbound_frames_parse() {
        let frame: Frame = serde_json::from_value(json!({
            "type": "menu-clicked",
            "menuId": "reload-30",
            "tab": 4,
        }))
        .unwrap();
        assert!(matches!(frame, Frame::MenuClicked { ref menu_id, tab } if menu_id == "reload-30" && tab == TabId(4)));

        let frame: Frame = serde_json::from_value(json!({
            "type": "message",
            "message": {"type": "page-interaction"},
            "senderTab": 7,
        }))
        .unwrap();
        assert!(matches!(
            frame,
            Frame::Message {
                message: Message::PageInteraction,
                sender_tab: Some(TabId(7)),
                id: None,
            }
        ));
    }
}
