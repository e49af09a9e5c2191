//! Dice expressions: parsing, rolling, and the audit trace.
//!
//! An expression is a signed sum of terms, each either an integer constant
//! or a dice term such as `3d6`. Randomness is always supplied by the
//! caller through [`RandomSource`], so evaluation is reproducible under a
//! seeded or stubbed source.

pub mod parse;
pub mod roll;

pub use roll::{DiceEvaluation, TermRoll};

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::error::{DiceError, DiceResult};

/// Largest number of dice a single term may roll.
pub const MAX_DICE_COUNT: u32 = 1000;

/// Largest number of sides a die may have.
pub const MAX_DIE_SIDES: u32 = 100_000;

/// A source of uniformly distributed integers.
pub trait RandomSource {
    /// Returns an integer in `min..=max`, uniformly distributed.
    fn next_in_range(&mut self, min: u32, max: u32) -> u32;
}

impl RandomSource for StdRng {
    fn next_in_range(&mut self, min: u32, max: u32) -> u32 {
        self.random_range(min..=max)
    }
}

impl<T: RandomSource + ?Sized> RandomSource for &mut T {
    fn next_in_range(&mut self, min: u32, max: u32) -> u32 {
        (**self).next_in_range(min, max)
    }
}

/// The sign applied to a whole term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Sign {
    /// Added to the total.
    #[default]
    Plus,
    /// Subtracted from the total.
    Minus,
}

impl Sign {
    /// Apply the sign to a non-negative magnitude.
    pub fn apply(self, magnitude: i64) -> i64 {
        match self {
            Self::Plus => magnitude,
            Self::Minus => -magnitude,
        }
    }

    fn from_operator(op: char) -> Self {
        if op == '-' { Self::Minus } else { Self::Plus }
    }
}

/// One term of a dice expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Term {
    /// An integer literal.
    Constant {
        /// Sign written before the literal.
        sign: Sign,
        /// The literal's magnitude.
        value: i64,
    },
    /// `count` dice with `sides` faces, summed before the sign applies.
    Dice {
        /// Sign written before the term.
        sign: Sign,
        /// Number of dice rolled.
        count: u32,
        /// Faces per die.
        sides: u32,
    },
}

impl Term {
    /// The sign of this term.
    pub fn sign(&self) -> Sign {
        match self {
            Self::Constant { sign, .. } | Self::Dice { sign, .. } => *sign,
        }
    }

    /// Writes the unsigned body of the term (`2d6`, `3`).
    fn fmt_body(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant { value, .. } => write!(f, "{value}"),
            Self::Dice { count, sides, .. } => write!(f, "{count}d{sides}"),
        }
    }
}

/// A parsed, validated dice expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceExpression {
    terms: Vec<Term>,
}

impl DiceExpression {
    /// Parse an expression such as `2d6+3` or `-d20 + 1d4 - 2`.
    ///
    /// Whitespace anywhere in the input is ignored.
    pub fn parse(input: &str) -> DiceResult<Self> {
        let terms = parse::parse_terms(input)?;
        Ok(Self { terms })
    }

    /// The terms in written order.
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Roll every dice term and sum the expression.
    pub fn roll<R: RandomSource + ?Sized>(&self, rng: &mut R) -> DiceResult<DiceEvaluation> {
        roll::evaluate_terms(&self.terms, rng)
    }
}

impl FromStr for DiceExpression {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DiceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            match (i, term.sign()) {
                (0, Sign::Plus) => {}
                (_, Sign::Minus) => write!(f, "-")?,
                (_, Sign::Plus) => write!(f, "+")?,
            }
            term.fmt_body(f)?;
        }
        Ok(())
    }
}

/// Parse and evaluate `expression` in one pass.
///
/// Fails with [`DiceError::MissingRandomSource`] when `rng` is `None`.
pub fn try_evaluate<R: RandomSource + ?Sized>(
    expression: &str,
    rng: Option<&mut R>,
) -> DiceResult<DiceEvaluation> {
    let result = match rng {
        Some(rng) => DiceExpression::parse(expression).and_then(|expr| expr.roll(rng)),
        None => Err(DiceError::MissingRandomSource),
    };
    match &result {
        Ok(evaluation) => tracing::trace!(expression, total = evaluation.total, "dice evaluated"),
        Err(err) => tracing::debug!(expression, error = %err, "dice expression rejected"),
    }
    result
}

/// Parse and evaluate `expression` against a present randomness source.
pub fn evaluate<R: RandomSource + ?Sized>(
    expression: &str,
    rng: &mut R,
) -> DiceResult<DiceEvaluation> {
    try_evaluate(expression, Some(rng))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::DiceErrorKind;
    use rand::SeedableRng;

    /// Always returns the same face.
    pub(crate) struct FixedRoll(pub u32);

    impl RandomSource for FixedRoll {
        fn next_in_range(&mut self, _min: u32, _max: u32) -> u32 {
            self.0
        }
    }

    /// Replays a fixed sequence of faces, cycling when exhausted.
    pub(crate) struct ScriptedRolls {
        faces: Vec<u32>,
        next: usize,
    }

    impl ScriptedRolls {
        pub(crate) fn new(faces: &[u32]) -> Self {
            Self {
                faces: faces.to_vec(),
                next: 0,
            }
        }
    }

    impl RandomSource for ScriptedRolls {
        fn next_in_range(&mut self, _min: u32, _max: u32) -> u32 {
            let face = self.faces[self.next % self.faces.len()];
            self.next += 1;
            face
        }
    }

    #[test]
    fn dice_plus_constant() {
        let result = evaluate("2d6+3", &mut FixedRoll(4)).unwrap();
        assert_eq!(result.total, 11);
        assert_eq!(result.display_text, "2d6(4,4) + 3 = 11");
    }

    #[test]
    fn negative_dice_term() {
        let result = evaluate("-1d4", &mut FixedRoll(3)).unwrap();
        assert_eq!(result.total, -3);
        assert_eq!(result.display_text, "-1d4(3) = -3");
    }

    #[test]
    fn sign_applies_to_whole_subtotal() {
        let result = evaluate("10 - 2d6", &mut ScriptedRolls::new(&[2, 5])).unwrap();
        assert_eq!(result.total, 3);
        assert_eq!(result.display_text, "10 - 2d6(2,5) = 3");
    }

    #[test]
    fn omitted_count_and_uppercase_d() {
        let result = evaluate("D20 + 2", &mut FixedRoll(17)).unwrap();
        assert_eq!(result.total, 19);
        assert_eq!(result.display_text, "1d20(17) + 2 = 19");
    }

    #[test]
    fn leading_plus_is_not_rendered() {
        let result = evaluate("+5-1", &mut FixedRoll(1)).unwrap();
        assert_eq!(result.total, 4);
        assert_eq!(result.display_text, "5 - 1 = 4");
    }

    #[test]
    fn negative_constant_only() {
        let result = evaluate("-7", &mut FixedRoll(1)).unwrap();
        assert_eq!(result.total, -7);
        assert_eq!(result.display_text, "-7 = -7");
    }

    #[test]
    fn count_out_of_range() {
        let err = evaluate("9999d2", &mut FixedRoll(1)).unwrap_err();
        assert_eq!(err.kind(), DiceErrorKind::Range);
        assert!(matches!(err, DiceError::CountOutOfRange { .. }));
    }

    #[test]
    fn zero_count_and_zero_sides_are_range_errors() {
        let err = evaluate("0d6", &mut FixedRoll(1)).unwrap_err();
        assert!(matches!(err, DiceError::CountOutOfRange { .. }));
        let err = evaluate("1d0", &mut FixedRoll(1)).unwrap_err();
        assert!(matches!(err, DiceError::SidesOutOfRange { .. }));
        let err = evaluate("1d100001", &mut FixedRoll(1)).unwrap_err();
        assert_eq!(err.kind(), DiceErrorKind::Range);
    }

    #[test]
    fn bounds_are_inclusive() {
        assert!(evaluate("1000d100000", &mut FixedRoll(1)).is_ok());
        assert!(evaluate("1d1", &mut FixedRoll(1)).is_ok());
    }

    #[test]
    fn malformed_expressions() {
        for input in ["3+-", "", "   ", "+-3", "4+", "-", "2d", "d", "abc", "2d6d4", "2x3"] {
            let err = evaluate(input, &mut FixedRoll(1)).unwrap_err();
            assert_eq!(err.kind(), DiceErrorKind::Parse, "input {input:?}");
        }
    }

    #[test]
    fn empty_expression_error() {
        assert_eq!(
            evaluate("", &mut FixedRoll(1)).unwrap_err(),
            DiceError::EmptyExpression
        );
    }

    #[test]
    fn missing_random_source() {
        let err = try_evaluate::<StdRng>("1d6", None).unwrap_err();
        assert_eq!(err, DiceError::MissingRandomSource);
        assert_eq!(err.kind(), DiceErrorKind::Precondition);
    }

    #[test]
    fn oversized_constant_is_invalid_number() {
        let err = evaluate("99999999999999999999", &mut FixedRoll(1)).unwrap_err();
        assert!(matches!(err, DiceError::InvalidNumber(_)));
    }

    #[test]
    fn seeded_rolls_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let result = evaluate("20d6", &mut rng).unwrap();
        let rolls = &result.terms[0].rolls;
        assert_eq!(rolls.len(), 20);
        assert!(rolls.iter().all(|r| (1..=6).contains(r)));
        assert_eq!(result.total, rolls.iter().map(|&r| i64::from(r)).sum::<i64>());
    }

    #[test]
    fn seeded_rolls_are_reproducible() {
        let a = evaluate("4d8+1", &mut StdRng::seed_from_u64(7)).unwrap();
        let b = evaluate("4d8+1", &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(a.display_text, b.display_text);
    }

    #[test]
    fn expression_display_is_canonical() {
        let expr: DiceExpression = " d20 + 2D6 - 3 ".parse().unwrap();
        assert_eq!(expr.to_string(), "1d20+2d6-3");
        let expr = DiceExpression::parse("-1d4+1").unwrap();
        assert_eq!(expr.to_string(), "-1d4+1");
    }

    #[test]
    fn dyn_source_through_reference() {
        let mut fixed = FixedRoll(2);
        let source: &mut dyn RandomSource = &mut fixed;
        let result = evaluate("3d4", source).unwrap();
        assert_eq!(result.total, 6);
    }
}
