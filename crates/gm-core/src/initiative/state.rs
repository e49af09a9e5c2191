//! The tracker aggregate and its state transitions.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{EntryId, InitiativeEntry, order};
use crate::error::{TrackerError, TrackerResult};

fn first_round() -> i32 {
    1
}

/// Snapshot of an initiative tracker.
///
/// Invariants (upheld by every operation, restored by [`TrackerState::normalize`]):
/// `round >= 1`; entry ids are unique; `active_id` is either `None` or
/// names exactly one entry; an empty tracker has no active entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerState {
    #[serde(default)]
    entries: Vec<InitiativeEntry>,
    #[serde(default = "first_round")]
    round: i32,
    #[serde(default)]
    active_id: Option<EntryId>,
}

impl Default for TrackerState {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackerState {
    /// The canonical empty tracker: no entries, round 1, nobody active.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            round: 1,
            active_id: None,
        }
    }

    /// Assemble a state from raw parts without validation.
    ///
    /// Intended for hosts rebuilding a state from storage; pass the result
    /// through [`TrackerState::normalize`] before use.
    pub fn from_parts(
        entries: Vec<InitiativeEntry>,
        round: i32,
        active_id: Option<EntryId>,
    ) -> Self {
        Self {
            entries,
            round,
            active_id,
        }
    }

    /// Entries in turn order (or insertion order until sorted).
    pub fn entries(&self) -> &[InitiativeEntry] {
        &self.entries
    }

    /// Current round number.
    pub fn round(&self) -> i32 {
        self.round
    }

    /// Id of the combatant whose turn it is.
    pub fn active_id(&self) -> Option<EntryId> {
        self.active_id
    }

    /// The combatant whose turn it is.
    pub fn active_entry(&self) -> Option<&InitiativeEntry> {
        self.active_id.and_then(|id| self.find(id))
    }

    /// Look up an entry by id.
    pub fn find(&self, id: EntryId) -> Option<&InitiativeEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Like [`TrackerState::find`], but a missing id is an error.
    pub fn entry(&self, id: EntryId) -> TrackerResult<&InitiativeEntry> {
        self.find(id).ok_or(TrackerError::EntryNotFound(id))
    }

    /// Index of the entry with the given id.
    pub fn position(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve user input to an entry: exact name (ignoring case) first,
    /// then id prefix.
    pub fn lookup(&self, input: &str) -> TrackerResult<&InitiativeEntry> {
        let needle = input.trim();
        if needle.is_empty() {
            return Err(TrackerError::NoMatch(input.to_string()));
        }
        let lower = needle.to_lowercase();
        let by_name: Vec<&InitiativeEntry> = self
            .entries
            .iter()
            .filter(|e| e.name.to_lowercase() == lower)
            .collect();
        let by_id: Vec<&InitiativeEntry> = self
            .entries
            .iter()
            .filter(|e| e.id.matches_prefix(needle))
            .collect();
        let candidates = if by_name.is_empty() { by_id } else { by_name };
        match candidates.as_slice() {
            [] => Err(TrackerError::NoMatch(needle.to_string())),
            [single] => Ok(*single),
            many => Err(TrackerError::AmbiguousEntry {
                input: needle.to_string(),
                candidates: many
                    .iter()
                    .map(|e| format!("{} ({})", e.name, e.id))
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }

    fn active_index(&self) -> Option<usize> {
        self.active_id.and_then(|id| self.position(id))
    }

    /// Append an entry. It becomes active if nobody is.
    ///
    /// An entry whose id is already present replaces that entry in place.
    pub fn add(&self, entry: InitiativeEntry) -> Self {
        let entry = entry.normalized();
        if self.position(entry.id).is_some() {
            return self.update(entry);
        }
        let mut next = self.clone();
        if next.active_index().is_none() {
            next.active_id = Some(entry.id);
        }
        tracing::debug!(id = %entry.id, name = %entry.name, "entry added");
        next.entries.push(entry);
        next
    }

    /// Replace the entry with the same id. Unknown ids are ignored.
    pub fn update(&self, entry: InitiativeEntry) -> Self {
        let Some(index) = self.position(entry.id) else {
            return self.clone();
        };
        let mut next = self.clone();
        next.entries[index] = entry.normalized();
        next
    }

    /// Remove an entry.
    ///
    /// Removing the active entry hands the turn to whoever now occupies the
    /// same position, or to the new last entry if it was at the end.
    pub fn remove(&self, id: EntryId) -> Self {
        let Some(index) = self.position(id) else {
            return self.clone();
        };
        let mut next = self.clone();
        next.entries.remove(index);
        if self.active_id == Some(id) {
            next.active_id = next
                .entries
                .get(index)
                .or_else(|| next.entries.last())
                .map(|e| e.id);
        }
        tracing::debug!(%id, "entry removed");
        next
    }

    /// Reset to the empty tracker regardless of the current contents.
    pub fn clear(&self) -> Self {
        Self::new()
    }

    /// Set the round, clamping anything below 1 to 1.
    pub fn set_round(&self, round: i32) -> Self {
        Self {
            round: round.max(1),
            ..self.clone()
        }
    }

    /// Make `id` the active entry if it exists.
    pub fn set_active(&self, id: EntryId) -> Self {
        if self.position(id).is_none() {
            return self.clone();
        }
        Self {
            active_id: Some(id),
            ..self.clone()
        }
    }

    /// Put entries into turn order.
    ///
    /// The active entry is kept if it still resolves; otherwise the first
    /// entry in the new order becomes active.
    pub fn sort(&self) -> Self {
        let entries = order::sorted(&self.entries);
        let active_id = match self.active_id {
            Some(id) if entries.iter().any(|e| e.id == id) => Some(id),
            _ => entries.first().map(|e| e.id),
        };
        Self {
            entries,
            round: self.round,
            active_id,
        }
    }

    /// Advance to the next combatant, starting a new round after the last.
    pub fn next_turn(&self) -> Self {
        let Some(first) = self.entries.first() else {
            return self.clone();
        };
        let mut next = self.clone();
        match self.active_index() {
            None => next.active_id = Some(first.id),
            Some(i) if i + 1 < self.entries.len() => {
                next.active_id = Some(self.entries[i + 1].id);
            }
            Some(_) => {
                next.active_id = Some(first.id);
                next.round = self.round.max(1).saturating_add(1);
                tracing::debug!(round = next.round, "new round");
            }
        }
        next
    }

    /// Step back to the previous combatant.
    ///
    /// Wrapping from the first entry to the last also steps the round back,
    /// never below 1.
    pub fn previous_turn(&self) -> Self {
        let (Some(first), Some(last)) = (self.entries.first(), self.entries.last()) else {
            return self.clone();
        };
        let mut next = self.clone();
        match self.active_index() {
            None => next.active_id = Some(first.id),
            Some(0) => {
                next.active_id = Some(last.id);
                next.round = self.round.saturating_sub(1).max(1);
            }
            Some(i) => next.active_id = Some(self.entries[i - 1].id),
        }
        next
    }

    /// Count down every timed condition by one round, dropping the ones
    /// that run out. Hosts call this when a new round starts.
    pub fn expire_conditions(&self) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .cloned()
                .map(InitiativeEntry::tick_conditions)
                .collect(),
            ..self.clone()
        }
    }

    /// Repair a state built outside the engine: normalize entries, floor the
    /// round at 1, and re-resolve a missing or dangling active id.
    ///
    /// A repeated id keeps the first entry that carries it; later entries
    /// with that id get fresh ids so every entry stays addressable.
    pub fn normalize(&self) -> Self {
        let mut seen = HashSet::new();
        let entries: Vec<InitiativeEntry> = self
            .entries
            .iter()
            .cloned()
            .map(|mut entry| {
                if !seen.insert(entry.id) {
                    let fresh = EntryId::new();
                    tracing::debug!(duplicate = %entry.id, %fresh, "duplicate entry id replaced");
                    entry.id = fresh;
                    seen.insert(fresh);
                }
                entry.normalized()
            })
            .collect();
        let active_id = match self.active_id {
            Some(id) if entries.iter().any(|e| e.id == id) => Some(id),
            _ => entries.first().map(|e| e.id),
        };
        Self {
            entries,
            round: self.round.max(1),
            active_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three() -> (TrackerState, [EntryId; 3]) {
        let a = InitiativeEntry::new("A", 10);
        let b = InitiativeEntry::new("B", 20);
        let c = InitiativeEntry::new("C", 15);
        let ids = [a.id, b.id, c.id];
        let state = TrackerState::new().add(a).add(b).add(c);
        (state, ids)
    }

    fn names(state: &TrackerState) -> Vec<&str> {
        state.entries().iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn new_state_is_canonical() {
        let s = TrackerState::new();
        assert!(s.is_empty());
        assert_eq!(s.round(), 1);
        assert_eq!(s.active_id(), None);
        assert_eq!(s, TrackerState::default());
    }

    #[test]
    fn add_activates_first_entry_only() {
        let (state, [a, _, _]) = three();
        assert_eq!(state.len(), 3);
        assert_eq!(state.active_id(), Some(a));
        assert_eq!(names(&state), vec!["A", "B", "C"]);
    }

    #[test]
    fn add_normalizes_name() {
        let state = TrackerState::new().add(InitiativeEntry::new("  ", 3));
        assert_eq!(state.entries()[0].name, "(Unnamed)");
    }

    #[test]
    fn add_does_not_mutate_input() {
        let empty = TrackerState::new();
        let _ = empty.add(InitiativeEntry::new("A", 1));
        assert!(empty.is_empty());
    }

    #[test]
    fn add_with_existing_id_replaces() {
        let (state, [_, b, _]) = three();
        let renamed = state.entry(b).unwrap().clone().with_name("Bravo");
        let state = state.add(renamed);
        assert_eq!(state.len(), 3);
        assert_eq!(names(&state), vec!["A", "Bravo", "C"]);
    }

    #[test]
    fn update_replaces_in_place() {
        let (state, [_, _, c]) = three();
        let changed = state.entry(c).unwrap().clone().with_initiative(1).with_name(" Cee ");
        let state = state.update(changed);
        assert_eq!(names(&state), vec!["A", "B", "Cee"]);
        assert_eq!(state.entry(c).unwrap().initiative, 1);
    }

    #[test]
    fn update_unknown_is_noop() {
        let (state, _) = three();
        assert_eq!(state.update(InitiativeEntry::new("Ghost", 1)), state);
    }

    #[test]
    fn remove_active_hands_turn_to_successor() {
        let (state, [a, b, _]) = three();
        let state = state.remove(a);
        assert_eq!(state.active_id(), Some(b));
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn remove_active_last_hands_turn_to_predecessor() {
        let (state, [_, b, c]) = three();
        let state = state.set_active(c).remove(c);
        assert_eq!(state.active_id(), Some(b));
    }

    #[test]
    fn remove_inactive_keeps_active() {
        let (state, [a, b, _]) = three();
        let state = state.remove(b);
        assert_eq!(state.active_id(), Some(a));
    }

    #[test]
    fn remove_last_entry_clears_active() {
        let entry = InitiativeEntry::new("Solo", 5);
        let id = entry.id;
        let state = TrackerState::new().add(entry).remove(id);
        assert!(state.is_empty());
        assert_eq!(state.active_id(), None);
    }

    #[test]
    fn remove_unknown_is_noop() {
        let (state, _) = three();
        assert_eq!(state.remove(EntryId::new()), state);
    }

    #[test]
    fn clear_ignores_input() {
        let (state, _) = three();
        let state = state.set_round(7).clear();
        assert_eq!(state, TrackerState::new());
    }

    #[test]
    fn set_round_clamps() {
        let s = TrackerState::new();
        assert_eq!(s.set_round(0).round(), 1);
        assert_eq!(s.set_round(-12).round(), 1);
        assert_eq!(s.set_round(4).round(), 4);
    }

    #[test]
    fn set_active_requires_existing_id() {
        let (state, [_, b, _]) = three();
        assert_eq!(state.set_active(b).active_id(), Some(b));
        assert_eq!(state.set_active(EntryId::new()), state);
    }

    #[test]
    fn sort_orders_and_keeps_active() {
        let (state, [a, _, _]) = three();
        let sorted = state.sort();
        assert_eq!(names(&sorted), vec!["B", "C", "A"]);
        assert_eq!(sorted.active_id(), Some(a));
    }

    #[test]
    fn sort_without_active_activates_first() {
        let (state, [_, b, _]) = three();
        let raw = TrackerState::from_parts(state.entries().to_vec(), 1, None);
        assert_eq!(raw.sort().active_id(), Some(b));
        let dangling = TrackerState::from_parts(state.entries().to_vec(), 1, Some(EntryId::new()));
        assert_eq!(dangling.sort().active_id(), Some(b));
    }

    #[test]
    fn sort_empty() {
        let s = TrackerState::new().sort();
        assert!(s.is_empty());
        assert_eq!(s.active_id(), None);
    }

    #[test]
    fn sort_is_idempotent() {
        let (state, _) = three();
        let state = state
            .add(InitiativeEntry::new("bob", 15))
            .add(InitiativeEntry::new("Alice", 15));
        let once = state.sort();
        assert_eq!(once.sort(), once);
    }

    #[test]
    fn sort_tie_break_case_insensitive() {
        let forward = TrackerState::new()
            .add(InitiativeEntry::new("Bob", 12).with_modifier(1))
            .add(InitiativeEntry::new("alice", 12).with_modifier(1))
            .sort();
        let backward = TrackerState::new()
            .add(InitiativeEntry::new("alice", 12).with_modifier(1))
            .add(InitiativeEntry::new("Bob", 12).with_modifier(1))
            .sort();
        assert_eq!(names(&forward), vec!["alice", "Bob"]);
        assert_eq!(names(&backward), vec!["alice", "Bob"]);
    }

    #[test]
    fn next_turn_cycles_and_counts_rounds() {
        let (state, [a, b, c]) = three();
        // Sorted: B(20), C(15), A(10). Start with B active.
        let state = state.sort().set_active(b);
        assert_eq!(state.round(), 1);

        let s1 = state.next_turn();
        assert_eq!((s1.active_id(), s1.round()), (Some(c), 1));
        let s2 = s1.next_turn();
        assert_eq!((s2.active_id(), s2.round()), (Some(a), 1));
        let s3 = s2.next_turn();
        assert_eq!((s3.active_id(), s3.round()), (Some(b), 2));
        let s4 = s3.next_turn();
        assert_eq!((s4.active_id(), s4.round()), (Some(c), 2));
    }

    #[test]
    fn next_turn_without_active_starts_at_first() {
        let (state, [a, _, _]) = three();
        let raw = TrackerState::from_parts(state.entries().to_vec(), 3, None);
        let next = raw.next_turn();
        assert_eq!(next.active_id(), Some(a));
        assert_eq!(next.round(), 3);
    }

    #[test]
    fn turns_on_empty_are_noops() {
        let s = TrackerState::new().set_round(4);
        assert_eq!(s.next_turn(), s);
        assert_eq!(s.previous_turn(), s);
    }

    #[test]
    fn previous_turn_steps_back() {
        let (state, [a, b, c]) = three();
        let state = state.set_active(c).set_round(3);
        let back = state.previous_turn();
        assert_eq!((back.active_id(), back.round()), (Some(b), 3));
        let back = back.previous_turn();
        assert_eq!((back.active_id(), back.round()), (Some(a), 3));
        let back = back.previous_turn();
        assert_eq!((back.active_id(), back.round()), (Some(c), 2));
    }

    #[test]
    fn previous_turn_round_floor() {
        let (state, [a, _, c]) = three();
        let back = state.set_active(a).previous_turn();
        assert_eq!(back.active_id(), Some(c));
        assert_eq!(back.round(), 1);
    }

    #[test]
    fn previous_turn_without_active_starts_at_first() {
        let (state, [a, _, _]) = three();
        let raw = TrackerState::from_parts(state.entries().to_vec(), 2, None);
        let back = raw.previous_turn();
        assert_eq!((back.active_id(), back.round()), (Some(a), 2));
    }

    #[test]
    fn normalize_repairs_raw_state() {
        let a = InitiativeEntry::new("  A  ", 3);
        let b = InitiativeEntry::new("", 2);
        let first = a.id;
        let raw = TrackerState::from_parts(vec![a, b], -3, Some(EntryId::new()));
        let fixed = raw.normalize();
        assert_eq!(fixed.round(), 1);
        assert_eq!(fixed.active_id(), Some(first));
        assert_eq!(names(&fixed), vec!["A", "(Unnamed)"]);
    }

    #[test]
    fn normalize_empty_drops_active() {
        let raw = TrackerState::from_parts(Vec::new(), 0, Some(EntryId::new()));
        assert_eq!(raw.normalize(), TrackerState::new());
    }

    #[test]
    fn normalize_is_identity_on_normalized() {
        let (state, _) = three();
        let state = state.sort().next_turn();
        assert_eq!(state.normalize(), state);
    }

    #[test]
    fn lookup_by_name_and_prefix() {
        let (state, [a, b, _]) = three();
        assert_eq!(state.lookup("a").unwrap().id, a);
        let prefix = b.to_string();
        assert_eq!(state.lookup(&prefix).unwrap().id, b);
        assert!(matches!(state.lookup("zed"), Err(TrackerError::NoMatch(_))));
        assert!(matches!(state.lookup("  "), Err(TrackerError::NoMatch(_))));
    }

    #[test]
    fn lookup_duplicate_names_is_ambiguous() {
        let state = TrackerState::new()
            .add(InitiativeEntry::new("Goblin", 12))
            .add(InitiativeEntry::new("goblin", 9));
        assert!(matches!(
            state.lookup("GOBLIN"),
            Err(TrackerError::AmbiguousEntry { .. })
        ));
    }

    #[test]
    fn serde_roundtrip() {
        let (state, _) = three();
        let json = serde_json::to_string(&state).unwrap();
        let back: TrackerState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn serde_tolerates_missing_fields() {
        let back: TrackerState = serde_json::from_str("{}").unwrap();
        assert_eq!(back, TrackerState::new());
    }

    #[test]
    fn normalize_makes_ids_unique() {
        let a = InitiativeEntry::new("Aria", 18);
        let twin = a.clone().with_name("Aria's echo");
        let state = TrackerState::from_parts(vec![a.clone(), twin], 1, Some(a.id)).normalize();
        assert_eq!(state.len(), 2);
        assert_eq!(state.entries()[0].id, a.id);
        assert_ne!(state.entries()[1].id, a.id);
        assert_eq!(state.entries()[1].name, "Aria's echo");
        let active = state.active_id().unwrap();
        assert_eq!(state.entries().iter().filter(|e| e.id == active).count(), 1);

        let removed = state.remove(a.id);
        assert_eq!(removed.len(), 1);
        assert_eq!(removed.active_id(), Some(removed.entries()[0].id));
        assert!(removed.find(a.id).is_none());
    }

    #[test]
    fn expire_conditions_counts_down() {
        use crate::condition::{AppliedCondition, ConditionId};

        let entry = InitiativeEntry::new("Orc", 9)
            .with_condition(AppliedCondition::new(ConditionId::new("prone")))
            .with_condition(AppliedCondition::for_rounds(ConditionId::new("stunned"), 1))
            .with_condition(AppliedCondition::for_rounds(ConditionId::new("poisoned"), 3));
        let state = TrackerState::new().add(entry).expire_conditions();
        let conditions = &state.entries()[0].conditions;
        assert_eq!(conditions.len(), 2);
        assert_eq!(conditions[0].rounds_remaining, None);
        assert_eq!(conditions[1].condition_id, ConditionId::new("poisoned"));
        assert_eq!(conditions[1].rounds_remaining, Some(2));
        assert_eq!(state.round(), 1);
    }
}
