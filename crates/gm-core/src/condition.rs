//! Status-effect markers attached to combatants.
//!
//! Conditions are defined outside the engine (a condition library owned by
//! the host). An [`AppliedCondition`] only carries the identifier of its
//! definition plus an optional countdown.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of an externally defined condition, e.g. `"prone"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionId(pub String);

impl ConditionId {
    /// Create an identifier from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConditionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A condition applied to a combatant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedCondition {
    /// Which definition this refers to.
    pub condition_id: ConditionId,
    /// Rounds left before the condition lapses; `None` means indefinite.
    ///
    /// Counted down by [`AppliedCondition::tick`] at the start of each round.
    #[serde(default)]
    pub rounds_remaining: Option<i32>,
}

impl AppliedCondition {
    /// An indefinite condition.
    pub fn new(condition_id: ConditionId) -> Self {
        Self {
            condition_id,
            rounds_remaining: None,
        }
    }

    /// A condition lasting `rounds` rounds.
    pub fn for_rounds(condition_id: ConditionId, rounds: i32) -> Self {
        Self {
            condition_id,
            rounds_remaining: Some(rounds),
        }
        .normalized()
    }

    /// One round passes. Returns `None` once the duration has run out.
    pub fn tick(self) -> Option<Self> {
        match self.rounds_remaining {
            None => Some(self),
            Some(rounds) if rounds > 1 => Some(Self {
                rounds_remaining: Some(rounds - 1),
                ..self
            }),
            Some(_) => None,
        }
    }

    /// Clamp a duration below 1 up to exactly 1.
    pub fn normalized(mut self) -> Self {
        if let Some(rounds) = self.rounds_remaining.as_mut() {
            *rounds = (*rounds).max(1);
        }
        self
    }
}

/// Lookup of condition definitions by identifier.
pub trait ConditionLibrary {
    /// Display name of the condition, if the library knows it.
    fn display_name(&self, id: &ConditionId) -> Option<&str>;
}

/// An in-memory condition library.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConditionCatalog {
    names: BTreeMap<ConditionId, String>,
}

impl ConditionCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition, replacing any previous one with the same id.
    pub fn with(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.names.insert(ConditionId::new(id), name.into());
        self
    }

    /// Number of known conditions.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if no conditions are registered.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl ConditionLibrary for ConditionCatalog {
    fn display_name(&self, id: &ConditionId) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }
}
