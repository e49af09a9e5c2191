//! The turn-order comparator.

use std::cmp::Ordering;

use super::InitiativeEntry;

/// Compare two entries by turn order, given their original positions.
///
/// Initiative descending, then modifier descending, then name ascending
/// ignoring case, then id ascending, then original position ascending. The
/// result is a total order, so sorting never depends on the algorithm's
/// stability.
pub fn turn_order(
    (a_pos, a): (usize, &InitiativeEntry),
    (b_pos, b): (usize, &InitiativeEntry),
) -> Ordering {
    b.initiative
        .cmp(&a.initiative)
        .then_with(|| b.modifier.cmp(&a.modifier))
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.id.cmp(&b.id))
        .then_with(|| a_pos.cmp(&b_pos))
}

/// Sort entries into turn order, returning them as owned values.
pub fn sorted(entries: &[InitiativeEntry]) -> Vec<InitiativeEntry> {
    let mut indexed: Vec<(usize, &InitiativeEntry)> = entries.iter().enumerate().collect();
    indexed.sort_by(|a, b| turn_order(*a, *b));
    indexed.into_iter().map(|(_, e)| e.clone()).collect()
}
