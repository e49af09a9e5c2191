//! Initiative tracking: combatants, turn order, and rounds.
//!
//! [`TrackerState`] is an immutable snapshot. Every operation borrows the
//! current state and returns a new one, so a host can keep history, diff
//! snapshots, or share them across threads without locking.

pub mod order;
pub mod state;

pub use state::TrackerState;

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::condition::AppliedCondition;

/// Name given to entries whose name is blank.
pub const UNNAMED: &str = "(Unnamed)";

/// Unique identifier of a tracker entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryId(pub Uuid);

impl EntryId {
    /// Generate a new random entry ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns true if the hyphenated form starts with `prefix` (case-insensitive).
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        !prefix.is_empty() && self.0.to_string().starts_with(&prefix.to_ascii_lowercase())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// One combatant in the turn order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiativeEntry {
    /// Stable identity for the lifetime of the entry.
    #[serde(default)]
    pub id: EntryId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Rolled or assigned initiative (higher acts first).
    #[serde(default)]
    pub initiative: i32,
    /// Tie-break modifier.
    #[serde(default, rename = "mod", alias = "modifier")]
    pub modifier: i32,
    /// Hidden entries keep their place in turn order but are left off
    /// player-facing displays.
    #[serde(default)]
    pub is_hidden: bool,
    /// Free-form game-master notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Conditions currently applied.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<AppliedCondition>,
}

impl InitiativeEntry {
    /// Create a visible entry with a fresh id.
    pub fn new(name: impl Into<String>, initiative: i32) -> Self {
        Self {
            id: EntryId::new(),
            name: name.into(),
            initiative,
            modifier: 0,
            is_hidden: false,
            notes: None,
            conditions: Vec::new(),
        }
    }

    /// Set the tie-break modifier.
    pub fn with_modifier(mut self, modifier: i32) -> Self {
        self.modifier = modifier;
        self
    }

    /// Set whether the entry is hidden from players.
    pub fn hidden(mut self, is_hidden: bool) -> Self {
        self.is_hidden = is_hidden;
        self
    }

    /// Attach notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Rename the entry, keeping its id.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Change the initiative value, keeping its id.
    pub fn with_initiative(mut self, initiative: i32) -> Self {
        self.initiative = initiative;
        self
    }

    /// Apply a condition, replacing an existing one with the same id.
    pub fn with_condition(mut self, condition: AppliedCondition) -> Self {
        self.conditions
            .retain(|c| c.condition_id != condition.condition_id);
        self.conditions.push(condition.normalized());
        self
    }

    /// Drop the condition with the given id, if present.
    pub fn without_condition(mut self, condition_id: &crate::condition::ConditionId) -> Self {
        self.conditions.retain(|c| &c.condition_id != condition_id);
        self
    }

    /// Let one round pass for every timed condition.
    pub fn tick_conditions(mut self) -> Self {
        self.conditions = self
            .conditions
            .into_iter()
            .filter_map(AppliedCondition::tick)
            .collect();
        self
    }

    /// Trim the name (blank becomes [`UNNAMED`]) and normalize conditions.
    pub fn normalized(mut self) -> Self {
        let trimmed = self.name.trim();
        self.name = if trimmed.is_empty() {
            UNNAMED.to_string()
        } else {
            trimmed.to_string()
        };
        self.conditions = self
            .conditions
            .into_iter()
            .map(AppliedCondition::normalized)
            .collect();
        self
    }
}
