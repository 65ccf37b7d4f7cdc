//! Mutable state of the single in-progress dialogue.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::catalog::CatalogEntry;

/// A named parameter a flow collects.
///
/// Reference slots are resolved against the catalog; value slots hold free
/// text spoken by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Board,
    List,
    Card,
    TargetBoard,
    TargetList,
    Title,
    NewName,
}

impl Slot {
    pub fn is_reference(self) -> bool {
        matches!(
            self,
            Slot::Board | Slot::List | Slot::Card | Slot::TargetBoard | Slot::TargetList
        )
    }

    /// The reference that must be resolved before this one can be looked up.
    pub fn parent(self) -> Option<Slot> {
        match self {
            Slot::List => Some(Slot::Board),
            Slot::Card => Some(Slot::List),
            Slot::TargetList => Some(Slot::TargetBoard),
            _ => None,
        }
    }

    /// Name used in internal error messages.
    pub fn label(self) -> &'static str {
        match self {
            Slot::Board => "Board ID",
            Slot::List => "Listen ID",
            Slot::Card => "Karten ID",
            Slot::TargetBoard => "Ziel-Board ID",
            Slot::TargetList => "Ziel-Listen ID",
            Slot::Title => "Kartentitel",
            Slot::NewName => "Neuer Name",
        }
    }

    fn stage_name(self) -> &'static str {
        match self {
            Slot::Board => "Board",
            Slot::List => "List",
            Slot::Card => "Card",
            Slot::TargetBoard => "TargetBoard",
            Slot::TargetList => "TargetList",
            Slot::Title => "Title",
            Slot::NewName => "NewName",
        }
    }
}

/// Where a flow currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Idle,
    /// Waiting for the user to name a slot value.
    Awaiting(Slot),
    /// A spoken name was not found; asked whether to list candidates.
    ConfirmNotFound(Slot),
    /// Every slot is filled; asked to confirm the action.
    ConfirmAction,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Idle => write!(f, "Idle"),
            Stage::Awaiting(slot) if slot.is_reference() => {
                write!(f, "WaitingFor{}Name", slot.stage_name())
            }
            Stage::Awaiting(slot) => write!(f, "WaitingFor{}", slot.stage_name()),
            Stage::ConfirmNotFound(slot) => write!(f, "Confirm{}NotFound", slot.stage_name()),
            Stage::ConfirmAction => write!(f, "ConfirmAction"),
        }
    }
}

/// Live state of one multi-turn dialogue.
#[derive(Debug, Clone, Default)]
pub struct FlowSession {
    /// Correlation id, set while the session is active.
    pub id: Option<Uuid>,
    pub stage: Stage,
    resolved: BTreeMap<Slot, CatalogEntry>,
    values: BTreeMap<Slot, String>,
    hints: BTreeMap<Slot, String>,
    /// Card description carried over from the intent.
    pub description: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
}

impl FlowSession {
    /// Start a fresh session seeded with unconfirmed hints.
    pub fn begin(&mut self, hints: BTreeMap<Slot, String>, description: Option<String>) {
        self.reset();
        self.id = Some(Uuid::new_v4());
        self.hints = hints;
        self.description = description;
        self.started_at = Some(Utc::now());
    }

    /// Drop everything and return to idle.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_active(&self) -> bool {
        self.stage != Stage::Idle
    }

    pub fn resolve(&mut self, slot: Slot, entry: CatalogEntry) {
        self.resolved.insert(slot, entry);
    }

    pub fn resolved(&self, slot: Slot) -> Option<&CatalogEntry> {
        self.resolved.get(&slot)
    }

    /// Display name of a resolved reference, or an empty string.
    pub fn name_of(&self, slot: Slot) -> &str {
        self.resolved(slot).map(|e| e.name.as_str()).unwrap_or_default()
    }

    pub fn set_value(&mut self, slot: Slot, value: String) {
        self.values.insert(slot, value);
    }

    pub fn value(&self, slot: Slot) -> Option<&str> {
        self.values.get(&slot).map(String::as_str)
    }

    /// Whether a slot holds a resolved reference or a value.
    pub fn is_filled(&self, slot: Slot) -> bool {
        self.resolved.contains_key(&slot) || self.values.contains_key(&slot)
    }

    /// Consume the pending hint for a slot.
    pub fn take_hint(&mut self, slot: Slot) -> Option<String> {
        self.hints.remove(&slot)
    }

    /// Read-only view for display.
    pub fn snapshot(&self, action: Option<&str>, context: &str) -> SessionSnapshot {
        SessionSnapshot {
            active: self.is_active(),
            session_id: self.id,
            action: action.map(str::to_string),
            stage: self.stage.to_string(),
            resolved: self
                .resolved
                .iter()
                .map(|(slot, entry)| (*slot, entry.name.clone()))
                .collect(),
            values: self.values.clone(),
            context: context.to_string(),
            started_at: self.started_at,
            updated_at: Utc::now(),
        }
    }
}

/// Serializable snapshot of the dialogue state, published to observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub active: bool,
    pub session_id: Option<Uuid>,
    pub action: Option<String>,
    pub stage: String,
    pub resolved: BTreeMap<Slot, String>,
    pub values: BTreeMap<Slot, String>,
    pub context: String,
    pub started_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl SessionSnapshot {
    /// Snapshot of an idle dialogue.
    pub fn idle() -> Self {
        FlowSession::default().snapshot(None, "")
    }
}
