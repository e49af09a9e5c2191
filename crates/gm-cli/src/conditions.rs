//! The host's built-in condition library.

use gm_core::ConditionCatalog;

/// Standard conditions every table knows, keyed by lower-case id.
const STANDARD: &[(&str, &str)] = &[
    ("blinded", "Blinded"),
    ("charmed", "Charmed"),
    ("concentrating", "Concentrating"),
    ("deafened", "Deafened"),
    ("exhausted", "Exhausted"),
    ("frightened", "Frightened"),
    ("grappled", "Grappled"),
    ("incapacitated", "Incapacitated"),
    ("invisible", "Invisible"),
    ("paralyzed", "Paralyzed"),
    ("petrified", "Petrified"),
    ("poisoned", "Poisoned"),
    ("prone", "Prone"),
    ("restrained", "Restrained"),
    ("stunned", "Stunned"),
    ("unconscious", "Unconscious"),
];

/// Build the catalog of standard conditions.
pub fn standard_catalog() -> ConditionCatalog {
    STANDARD
        .iter()
        .fold(ConditionCatalog::new(), |catalog, (id, name)| {
            catalog.with(*id, *name)
        })
}
