//! Evaluation of parsed terms and the trace string.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{RandomSource, Sign, Term};
use crate::error::{DiceError, DiceResult};

/// The outcome of one term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermRoll {
    /// The term that was evaluated.
    pub term: Term,
    /// Individual faces rolled (empty for constants).
    pub rolls: Vec<u32>,
    /// Signed contribution to the total.
    pub value: i64,
}

/// The result of evaluating a whole expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceEvaluation {
    /// Signed sum of every term.
    pub total: i64,
    /// Human-readable trace, e.g. `2d6(4,4) + 3 = 11`.
    pub display_text: String,
    /// Per-term breakdown in written order.
    pub terms: Vec<TermRoll>,
}

impl fmt::Display for DiceEvaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_text)
    }
}

/// Roll every term against `rng` and build the trace.
pub fn evaluate_terms<R: RandomSource + ?Sized>(
    terms: &[Term],
    rng: &mut R,
) -> DiceResult<DiceEvaluation> {
    let mut total: i64 = 0;
    let mut rolled = Vec::with_capacity(terms.len());

    for term in terms {
        let (rolls, magnitude) = match *term {
            Term::Constant { value, .. } => (Vec::new(), value),
            Term::Dice { count, sides, .. } => {
                let rolls: Vec<u32> = (0..count).map(|_| rng.next_in_range(1, sides)).collect();
                let subtotal: i64 = rolls.iter().map(|&r| i64::from(r)).sum();
                (rolls, subtotal)
            }
        };
        let value = term.sign().apply(magnitude);
        total = total
            .checked_add(value)
            .ok_or(DiceError::TotalOverflow)?;
        rolled.push(TermRoll {
            term: *term,
            rolls,
            value,
        });
    }

    let display_text = render_trace(&rolled, total);
    Ok(DiceEvaluation {
        total,
        display_text,
        terms: rolled,
    })
}

fn render_trace(terms: &[TermRoll], total: i64) -> String {
    let mut out = String::new();
    for (i, roll) in terms.iter().enumerate() {
        let separator = match (i, roll.term.sign()) {
            (0, Sign::Plus) => "",
            (0, Sign::Minus) => "-",
            (_, Sign::Plus) => " + ",
            (_, Sign::Minus) => " - ",
        };
        out.push_str(separator);
        match roll.term {
            Term::Constant { value, .. } => out.push_str(&value.to_string()),
            Term::Dice { count, sides, .. } => {
                let faces: Vec<String> = roll.rolls.iter().map(u32::to_string).collect();
                out.push_str(&format!("{count}d{sides}({})", faces.join(",")));
            }
        }
    }
    out.push_str(&format!(" = {total}"));
    out
}
