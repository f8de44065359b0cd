//! Per-tab timer entries and the merge rules applied on every update

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::tasks::IntervalHandle;

/// Opaque handle to a host browser tab. Unique among live entries, not
/// stable across browser restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub u32);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Policy applied when a page-interaction signal arrives for a tab.
///
/// On the wire this is `"reset"`, `"cancel"` or JSON `null`; `"none"` is also
/// accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResetPolicy {
    Reset,
    Cancel,
    #[default]
    None,
}

impl ResetPolicy {
    /// Whether this policy needs the page-interaction listener attached.
    pub fn tracks_interaction(self) -> bool {
        !matches!(self, ResetPolicy::None)
    }
}

impl Serialize for ResetPolicy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ResetPolicy::Reset => serializer.serialize_str("reset"),
            ResetPolicy::Cancel => serializer.serialize_str("cancel"),
            ResetPolicy::None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for ResetPolicy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(ResetPolicy::None),
            Some(value) => match value.as_str() {
                "reset" => Ok(ResetPolicy::Reset),
                "cancel" => Ok(ResetPolicy::Cancel),
                "none" => Ok(ResetPolicy::None),
                other => Err(D::Error::unknown_variant(other, &["reset", "cancel", "none"])),
            },
        }
    }
}

/// One tab's auto-reload state.
///
/// `interval` is the ownership token for the scheduled reload task; dropping
/// the entry (or replacing the handle) aborts the task, so at most one live
/// task exists per tab. Entries without a `duration` exist when an
/// interaction policy is chosen before any interval; they carry no task and
/// are skipped by restore.
#[derive(Debug)]
pub struct TimerEntry {
    pub interval: Option<IntervalHandle>,
    pub duration: Option<u32>,
    pub reset_on_interaction: ResetPolicy,
}

impl TimerEntry {
    /// Drop the running reload task, keeping the rest of the entry.
    pub fn cancel_interval(&mut self) {
        self.interval = None;
    }

    /// The persistable view of this entry.
    pub fn session_record(&self) -> SessionTimer {
        SessionTimer {
            duration: self.duration,
            reset_on_interaction: self.reset_on_interaction,
        }
    }
}

/// Partial update merged onto a tab's entry.
#[derive(Debug, Default)]
pub struct TimerUpdate {
    pub interval: Option<IntervalHandle>,
    pub duration: Option<u32>,
    pub reset_on_interaction: Option<ResetPolicy>,
}

/// Three-way merge with precedence update > existing > defaults.
///
/// Consumes the existing entry; a handle displaced by `update.interval` is
/// dropped here, aborting its task.
pub fn merge_entry(
    existing: Option<TimerEntry>,
    update: TimerUpdate,
    default_policy: ResetPolicy,
) -> TimerEntry {
    match existing {
        Some(existing) => TimerEntry {
            interval: match update.interval {
                Some(interval) => Some(interval),
                None => existing.interval,
            },
            duration: update.duration.or(existing.duration),
            reset_on_interaction: update
                .reset_on_interaction
                .unwrap_or(existing.reset_on_interaction),
        },
        None => TimerEntry {
            interval: update.interval,
            duration: update.duration,
            reset_on_interaction: update.reset_on_interaction.unwrap_or(default_policy),
        },
    }
}

/// Volatile per-tab session record, scoped to the tab's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTimer {
    pub duration: Option<u32>,
    #[serde(default)]
    pub reset_on_interaction: ResetPolicy,
}

/// Durable record keyed by a normalized URL, created only by an explicit
/// save action.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTimer {
    pub duration: u32,
    #[serde(default)]
    pub reset_on_interaction: ResetPolicy,
}
