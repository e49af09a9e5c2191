//! Player-facing rendering of the turn order.
//!
//! Produces the plain-text block a portal display shows to players: an
//! optional round header, one line per visible combatant, and a trailer
//! when the list is truncated.

use serde::{Deserialize, Serialize};

use crate::condition::{AppliedCondition, ConditionLibrary};
use crate::initiative::{InitiativeEntry, TrackerState};

/// Marker in front of the combatant whose turn it is.
pub const ACTIVE_MARKER: &str = "> ";

/// Padding in front of everyone else, aligned with [`ACTIVE_MARKER`].
pub const IDLE_MARKER: &str = "  ";

/// What the portal shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalDisplayConfig {
    /// Print a `Round N` header.
    pub show_round: bool,
    /// Prefix each line with the initiative value.
    pub show_initiative_values: bool,
    /// Include hidden combatants.
    pub include_hidden: bool,
    /// Maximum number of lines; zero or negative means unlimited.
    pub max_entries: i32,
    /// Append applied conditions to each line.
    pub show_conditions: bool,
}

impl Default for PortalDisplayConfig {
    fn default() -> Self {
        Self {
            show_round: true,
            show_initiative_values: false,
            include_hidden: false,
            max_entries: 0,
            show_conditions: false,
        }
    }
}

impl PortalDisplayConfig {
    /// Toggle the round header.
    pub fn with_round(mut self, show: bool) -> Self {
        self.show_round = show;
        self
    }

    /// Toggle initiative values.
    pub fn with_initiative_values(mut self, show: bool) -> Self {
        self.show_initiative_values = show;
        self
    }

    /// Toggle hidden combatants.
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Limit the number of combatant lines (zero or negative: unlimited).
    pub fn with_max_entries(mut self, max: i32) -> Self {
        self.max_entries = max;
        self
    }

    /// Toggle condition lists.
    pub fn with_conditions(mut self, show: bool) -> Self {
        self.show_conditions = show;
        self
    }

    fn limit(&self) -> Option<usize> {
        usize::try_from(self.max_entries).ok().filter(|&n| n > 0)
    }
}

/// Render the tracker, showing conditions by their raw ids.
pub fn render_tracker(state: &TrackerState, config: &PortalDisplayConfig) -> String {
    render(state, config, |c| c.condition_id.as_str().to_string())
}

/// Render the tracker, naming conditions through `library`.
///
/// Conditions the library does not know fall back to their id.
pub fn render_tracker_with(
    state: &TrackerState,
    config: &PortalDisplayConfig,
    library: &dyn ConditionLibrary,
) -> String {
    render(state, config, |c| {
        library
            .display_name(&c.condition_id)
            .unwrap_or(c.condition_id.as_str())
            .to_string()
    })
}

fn render(
    state: &TrackerState,
    config: &PortalDisplayConfig,
    condition_name: impl Fn(&AppliedCondition) -> String,
) -> String {
    let mut lines = Vec::new();
    if config.show_round {
        lines.push(format!("Round {}", state.round()));
    }

    let visible: Vec<&InitiativeEntry> = state
        .entries()
        .iter()
        .filter(|e| config.include_hidden || !e.is_hidden)
        .collect();
    let shown = config.limit().map_or(visible.len(), |n| n.min(visible.len()));

    for entry in &visible[..shown] {
        let marker = if state.active_id() == Some(entry.id) {
            ACTIVE_MARKER
        } else {
            IDLE_MARKER
        };
        let mut line = String::from(marker);
        if config.show_initiative_values {
            line.push_str(&format!("[{}] ", entry.initiative));
        }
        line.push_str(&entry.name);
        if config.show_conditions && !entry.conditions.is_empty() {
            let names: Vec<String> = entry
                .conditions
                .iter()
                .map(|c| match c.rounds_remaining {
                    Some(rounds) => format!("{} ({rounds})", condition_name(c)),
                    None => condition_name(c),
                })
                .collect();
            line.push_str(&format!(" - {}", names.join(", ")));
        }
        lines.push(line);
    }

    let hidden_by_limit = visible.len() - shown;
    if hidden_by_limit > 0 {
        lines.push(format!("+{hidden_by_limit} more"));
    }

    lines.join("\n")
}
