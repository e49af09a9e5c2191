use std::path::Path;

use clap::Subcommand;
use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use gm_core::{
    AppliedCondition, ConditionCatalog, ConditionId, ConditionLibrary, InitiativeEntry,
    PortalDisplayConfig, TrackerState, evaluate, render_tracker_with,
};

use crate::conditions::standard_catalog;
use crate::resolve::resolve_entry;
use crate::session;

#[derive(Subcommand)]
pub enum TrackerCommand {
    /// Add a combatant to the end of the turn order
    Add {
        /// Display name
        name: String,

        /// Initiative value
        #[arg(short, long, allow_negative_numbers = true, required_unless_present = "roll")]
        init: Option<i32>,

        /// Roll initiative from a dice expression instead (e.g. "1d20+2")
        #[arg(short, long, allow_hyphen_values = true, conflicts_with = "init")]
        roll: Option<String>,

        /// Tie-break modifier
        #[arg(short, long = "mod", default_value_t = 0, allow_negative_numbers = true)]
        modifier: i32,

        /// Hide from the player portal
        #[arg(long)]
        hidden: bool,

        /// Game-master notes
        #[arg(short, long)]
        notes: Option<String>,

        /// RNG seed when rolling initiative
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Change fields of an existing combatant
    Update {
        /// Name or id prefix
        target: String,

        /// New display name
        #[arg(long)]
        name: Option<String>,

        /// New initiative value
        #[arg(short, long, allow_negative_numbers = true)]
        init: Option<i32>,

        /// New tie-break modifier
        #[arg(short, long = "mod", allow_negative_numbers = true)]
        modifier: Option<i32>,

        /// Hide from (true) or show on (false) the player portal
        #[arg(long)]
        hidden: Option<bool>,

        /// Replace notes (an empty string clears them)
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Remove a combatant
    Remove {
        /// Name or id prefix
        target: String,
    },

    /// Remove everyone and reset to round 1
    Clear,

    /// Set the round number
    Round {
        /// Round number (values below 1 become 1)
        #[arg(allow_negative_numbers = true)]
        round: i32,
    },

    /// Give the turn to a specific combatant
    Activate {
        /// Name or id prefix
        target: String,
    },

    /// Sort by initiative, modifier, then name
    Sort,

    /// Advance to the next turn, counting down conditions when a round starts
    Next,

    /// Go back to the previous turn
    Prev,

    /// Apply or remove a condition
    Condition {
        /// Name or id prefix
        target: String,

        /// Condition id (e.g. prone, poisoned)
        condition: String,

        /// Duration in rounds (values below 1 become 1)
        #[arg(long, allow_negative_numbers = true)]
        rounds: Option<i32>,

        /// Remove the condition instead of applying it
        #[arg(long, conflicts_with = "rounds")]
        remove: bool,
    },

    /// Show the full turn order, hidden combatants included
    List,

    /// Print the player-facing portal text
    Show {
        /// Leave out the round header
        #[arg(long)]
        no_round: bool,

        /// Show initiative values
        #[arg(long)]
        initiative: bool,

        /// Include hidden combatants
        #[arg(long)]
        include_hidden: bool,

        /// Maximum number of combatants (0 for unlimited)
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        max: i32,

        /// Show applied conditions
        #[arg(long)]
        conditions: bool,
    },
}

pub fn run(path: &Path, command: TrackerCommand) -> Result<(), String> {
    let state = session::load(path).map_err(|e| e.to_string())?;
    let catalog = standard_catalog();

    match command {
        TrackerCommand::List => {
            print_table(&state, &catalog);
            Ok(())
        }
        TrackerCommand::Show {
            no_round,
            initiative,
            include_hidden,
            max,
            conditions,
        } => {
            let config = PortalDisplayConfig::default()
                .with_round(!no_round)
                .with_initiative_values(initiative)
                .with_hidden(include_hidden)
                .with_max_entries(max)
                .with_conditions(conditions);
            println!("{}", render_tracker_with(&state, &config, &catalog));
            Ok(())
        }
        command => {
            let (next, message) = apply(&state, command, &catalog)?;
            session::save(path, &next).map_err(|e| e.to_string())?;
            println!("  {message}");
            Ok(())
        }
    }
}

/// Apply a mutating command, returning the new state and a summary line.
fn apply(
    state: &TrackerState,
    command: TrackerCommand,
    catalog: &ConditionCatalog,
) -> Result<(TrackerState, String), String> {
    match command {
        TrackerCommand::Add {
            name,
            init,
            roll,
            modifier,
            hidden,
            notes,
            seed,
        } => {
            let (initiative, detail) = match (init, roll) {
                (_, Some(expression)) => roll_initiative(&expression, seed)?,
                (Some(value), None) => (value, format!("initiative {value}")),
                (None, None) => return Err("either --init or --roll is required".into()),
            };
            let mut entry = InitiativeEntry::new(name, initiative)
                .with_modifier(modifier)
                .hidden(hidden);
            if let Some(notes) = notes {
                entry = entry.with_notes(notes);
            }
            let next = state.add(entry.clone());
            let added = next.find(entry.id).map_or(entry.name.clone(), |e| e.name.clone());
            Ok((next, format!("Added {} ({}), {detail}", added.bold(), entry.id)))
        }
        TrackerCommand::Update {
            target,
            name,
            init,
            modifier,
            hidden,
            notes,
        } => {
            let id = resolve_entry(state, &target)?;
            let mut entry = state.entry(id).map_err(|e| e.to_string())?.clone();
            if let Some(name) = name {
                entry = entry.with_name(name);
            }
            if let Some(init) = init {
                entry = entry.with_initiative(init);
            }
            if let Some(modifier) = modifier {
                entry = entry.with_modifier(modifier);
            }
            if let Some(hidden) = hidden {
                entry = entry.hidden(hidden);
            }
            if let Some(notes) = notes {
                entry.notes = (!notes.trim().is_empty()).then_some(notes);
            }
            let next = state.update(entry);
            let name = display_name(&next, id);
            Ok((next, format!("Updated {}", name.bold())))
        }
        TrackerCommand::Remove { target } => {
            let id = resolve_entry(state, &target)?;
            let name = display_name(state, id);
            let next = state.remove(id);
            Ok((next, format!("Removed {}", name.bold())))
        }
        TrackerCommand::Clear => Ok((state.clear(), "Cleared the tracker".to_string())),
        TrackerCommand::Round { round } => {
            let next = state.set_round(round);
            let message = format!("Round set to {}", next.round());
            Ok((next, message))
        }
        TrackerCommand::Activate { target } => {
            let id = resolve_entry(state, &target)?;
            let next = state.set_active(id);
            let message = turn_summary(&next);
            Ok((next, message))
        }
        TrackerCommand::Sort => {
            let next = state.sort();
            let message = format!("Sorted {} combatants. {}", next.len(), turn_summary(&next));
            Ok((next, message))
        }
        TrackerCommand::Next => {
            let mut next = state.next_turn();
            if next.round() > state.round() {
                next = next.expire_conditions();
            }
            let message = turn_summary(&next);
            Ok((next, message))
        }
        TrackerCommand::Prev => {
            let next = state.previous_turn();
            let message = turn_summary(&next);
            Ok((next, message))
        }
        TrackerCommand::Condition {
            target,
            condition,
            rounds,
            remove,
        } => {
            let id = resolve_entry(state, &target)?;
            let entry = state.entry(id).map_err(|e| e.to_string())?.clone();
            let condition_id = ConditionId::new(condition.trim().to_lowercase());
            let label = catalog
                .display_name(&condition_id)
                .unwrap_or(condition_id.as_str())
                .to_string();
            let name = entry.name.clone();
            if remove {
                let next = state.update(entry.without_condition(&condition_id));
                Ok((next, format!("{} is no longer {label}", name.bold())))
            } else {
                let applied = match rounds {
                    Some(rounds) => AppliedCondition::for_rounds(condition_id, rounds),
                    None => AppliedCondition::new(condition_id),
                };
                let duration = applied
                    .rounds_remaining
                    .map(|r| format!(" for {r} round{}", if r == 1 { "" } else { "s" }))
                    .unwrap_or_default();
                let next = state.update(entry.with_condition(applied));
                Ok((next, format!("{} is {label}{duration}", name.bold())))
            }
        }
        TrackerCommand::List | TrackerCommand::Show { .. } => {
            Err("read-only command cannot be applied".into())
        }
    }
}

/// Roll an initiative value, returning it with the roll trace.
fn roll_initiative(expression: &str, seed: Option<u64>) -> Result<(i32, String), String> {
    let mut rng = super::make_rng(seed);
    let result = evaluate(expression, &mut rng)
        .map_err(|e| format!("cannot roll initiative '{expression}': {e}"))?;
    let value = i32::try_from(result.total)
        .map_err(|_| format!("initiative roll {} is out of range", result.total))?;
    Ok((value, format!("rolled {}", result.display_text)))
}

fn display_name(state: &TrackerState, id: gm_core::EntryId) -> String {
    state
        .find(id)
        .map(|e| e.name.clone())
        .unwrap_or_else(|| id.to_string())
}

fn turn_summary(state: &TrackerState) -> String {
    match state.active_entry() {
        Some(entry) => format!("Round {}: {}'s turn", state.round(), entry.name.bold()),
        None => format!("Round {}: no combatants", state.round()),
    }
}

/// Print the game-master view of the tracker.
fn print_table(state: &TrackerState, catalog: &ConditionCatalog) {
    println!("  Round {}", state.round());
    if state.is_empty() {
        println!("  No combatants.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["", "Id", "Name", "Init", "Mod", "Hidden", "Conditions", "Notes"]);

    for entry in state.entries() {
        let marker = if state.active_id() == Some(entry.id) { ">" } else { "" };
        let conditions: Vec<String> = entry
            .conditions
            .iter()
            .map(|c| {
                let label = catalog
                    .display_name(&c.condition_id)
                    .unwrap_or(c.condition_id.as_str());
                match c.rounds_remaining {
                    Some(rounds) => format!("{label} ({rounds})"),
                    None => label.to_string(),
                }
            })
            .collect();
        table.add_row(vec![
            marker.to_string(),
            entry.id.to_string(),
            entry.name.clone(),
            entry.initiative.to_string(),
            format!("{:+}", entry.modifier),
            if entry.is_hidden { "yes" } else { "" }.to_string(),
            conditions.join(", "),
            entry.notes.clone().unwrap_or_default(),
        ]);
    }

    println!("{table}");
    println!();
    println!("  {} combatants", state.len());
}
