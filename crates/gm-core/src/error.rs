//! Error types for the session engine.

use crate::initiative::EntryId;

/// Alias for `Result<T, DiceError>`.
pub type DiceResult<T> = Result<T, DiceError>;

/// Alias for `Result<T, TrackerError>`.
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Broad category of a dice evaluation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiceErrorKind {
    /// The expression does not match the dice grammar.
    Parse,
    /// A count, side count, or total falls outside the permitted bounds.
    Range,
    /// A required input (the randomness source) was not supplied.
    Precondition,
}

/// Errors produced while parsing or evaluating a dice expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiceError {
    /// The expression contained nothing but whitespace.
    #[error("dice expression is empty")]
    EmptyExpression,

    /// An operator was not followed by a term, e.g. `3+` or `+-3`.
    #[error("empty term at position {position}")]
    EmptyTerm {
        /// Byte offset (after whitespace removal) where the term was expected.
        position: usize,
    },

    /// A term is neither an integer nor a dice term.
    #[error("invalid term: '{0}'")]
    InvalidTerm(String),

    /// A numeric literal could not be represented.
    #[error("invalid number: '{0}'")]
    InvalidNumber(String),

    /// The dice count is outside `1..=1000`.
    #[error("dice count {count} is out of range (1-{max})")]
    CountOutOfRange {
        /// The rejected count, as written.
        count: String,
        /// The largest permitted count.
        max: u32,
    },

    /// The number of sides is outside `1..=100000`.
    #[error("die sides {sides} is out of range (1-{max})")]
    SidesOutOfRange {
        /// The rejected side count, as written.
        sides: String,
        /// The largest permitted side count.
        max: u32,
    },

    /// The running total no longer fits in a signed 64-bit integer.
    #[error("total is too large")]
    TotalOverflow,

    /// No randomness source was supplied.
    #[error("no random source supplied")]
    MissingRandomSource,
}

impl DiceError {
    /// The category this error belongs to.
    pub fn kind(&self) -> DiceErrorKind {
        match self {
            Self::EmptyExpression
            | Self::EmptyTerm { .. }
            | Self::InvalidTerm(_)
            | Self::InvalidNumber(_) => DiceErrorKind::Parse,
            Self::CountOutOfRange { .. } | Self::SidesOutOfRange { .. } | Self::TotalOverflow => {
                DiceErrorKind::Range
            }
            Self::MissingRandomSource => DiceErrorKind::Precondition,
        }
    }
}

/// Errors raised when a host looks up tracker entries.
///
/// Engine operations themselves never fail: unknown ids leave the state
/// unchanged. These errors cover lookups a host performs before calling them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackerError {
    /// No entry has the given id.
    #[error("entry not found: {0}")]
    EntryNotFound(EntryId),

    /// No entry matches the given name or id prefix.
    #[error("no combatant matches '{0}'")]
    NoMatch(String),

    /// More than one entry matches the given name or id prefix.
    #[error("'{input}' is ambiguous: {candidates}")]
    AmbiguousEntry {
        /// What the user typed.
        input: String,
        /// Comma-separated names of the matching entries.
        candidates: String,
    },
}
