//! Resolve command-line targets to tracker entries.

use strsim::jaro_winkler;

use gm_core::{EntryId, TrackerError, TrackerState};

/// Minimum similarity score for fuzzy matching (0.0-1.0).
const FUZZY_THRESHOLD: f64 = 0.8;

/// Minimum similarity score for "did you mean" suggestions.
const SUGGEST_THRESHOLD: f64 = 0.6;

/// Resolve a name or id prefix, falling back to a unique fuzzy name match.
pub fn resolve_entry(state: &TrackerState, input: &str) -> Result<EntryId, String> {
    match state.lookup(input) {
        Ok(entry) => Ok(entry.id),
        Err(TrackerError::NoMatch(_)) => {
            let matches = fuzzy_match(state, input, FUZZY_THRESHOLD);
            match matches.as_slice() {
                [(id, _)] => Ok(*id),
                _ => Err(not_found_message(state, input)),
            }
        }
        Err(e) => Err(e.to_string()),
    }
}

/// Entries whose names score at least `threshold` against `input`,
/// best match first.
fn fuzzy_match(state: &TrackerState, input: &str, threshold: f64) -> Vec<(EntryId, f64)> {
    let input_lower = input.trim().to_lowercase();
    let mut matches: Vec<(EntryId, f64)> = state
        .entries()
        .iter()
        .filter_map(|entry| {
            let score = jaro_winkler(&input_lower, &entry.name.to_lowercase());
            (score >= threshold).then_some((entry.id, score))
        })
        .collect();
    matches.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    matches
}

fn not_found_message(state: &TrackerState, input: &str) -> String {
    let suggestions: Vec<String> = fuzzy_match(state, input, SUGGEST_THRESHOLD)
        .into_iter()
        .take(3)
        .filter_map(|(id, _)| state.find(id).map(|e| e.name.clone()))
        .collect();
    if suggestions.is_empty() {
        format!("no combatant matches '{}'", input.trim())
    } else {
        format!(
            "no combatant matches '{}' (did you mean {}?)",
            input.trim(),
            suggestions.join(", ")
        )
    }
}
