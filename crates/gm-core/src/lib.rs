//! Session state engine for Game Master Portals.
//!
//! Two independent pure engines: an initiative tracker that governs combat
//! rounds and the active combatant, and a dice expression evaluator that
//! rolls algebraic dice notation against a caller-supplied randomness
//! source. Neither performs I/O or owns state beyond the values it returns.

pub mod condition;
pub mod dice;
pub mod error;
pub mod format;
pub mod initiative;

pub use condition::{AppliedCondition, ConditionCatalog, ConditionId, ConditionLibrary};
pub use dice::{
    DiceEvaluation, DiceExpression, RandomSource, Term, TermRoll, evaluate, try_evaluate,
};
pub use error::{DiceError, DiceErrorKind, DiceResult, TrackerError, TrackerResult};
pub use format::{PortalDisplayConfig, render_tracker, render_tracker_with};
pub use initiative::{EntryId, InitiativeEntry, TrackerState};
