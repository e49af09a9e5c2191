//! Single-pass scanner for dice expressions.
//!
//! Whitespace is stripped first. The scanner then walks term boundaries:
//! each term runs until the next `+` or `-`, and every term after the first
//! must be introduced by exactly one operator.

use super::{MAX_DICE_COUNT, MAX_DIE_SIDES, Sign, Term};
use crate::error::{DiceError, DiceResult};

/// Split `input` into validated terms.
pub fn parse_terms(input: &str) -> DiceResult<Vec<Term>> {
    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(DiceError::EmptyExpression);
    }

    let mut terms = Vec::new();
    let mut pos = 0;
    let mut sign = Sign::Plus;

    // Only the first term may carry its own sign.
    if let Some(op @ ('+' | '-')) = compact.chars().next() {
        sign = Sign::from_operator(op);
        pos = 1;
    }

    loop {
        let rest = &compact[pos..];
        let end = rest.find(is_operator).unwrap_or(rest.len());
        let text = &rest[..end];
        if text.is_empty() {
            return Err(DiceError::EmptyTerm { position: pos });
        }
        terms.push(parse_term(text, sign)?);

        pos += end;
        match compact[pos..].chars().next() {
            Some(op) => {
                sign = Sign::from_operator(op);
                pos += op.len_utf8();
            }
            None => break,
        }
    }

    Ok(terms)
}

fn is_operator(c: char) -> bool {
    c == '+' || c == '-'
}

/// Parse one unsigned term body.
fn parse_term(text: &str, sign: Sign) -> DiceResult<Term> {
    let Some(d_pos) = text.find(['d', 'D']) else {
        if !is_digits(text) {
            return Err(DiceError::InvalidTerm(text.to_string()));
        }
        let value = text
            .parse::<i64>()
            .map_err(|_| DiceError::InvalidNumber(text.to_string()))?;
        return Ok(Term::Constant { sign, value });
    };

    let count_text = &text[..d_pos];
    let sides_text = &text[d_pos + 1..];

    let count = if count_text.is_empty() {
        1
    } else {
        parse_bounded(count_text, text, MAX_DICE_COUNT, |count| {
            DiceError::CountOutOfRange {
                count,
                max: MAX_DICE_COUNT,
            }
        })?
    };
    let sides = parse_bounded(sides_text, text, MAX_DIE_SIDES, |sides| {
        DiceError::SidesOutOfRange {
            sides,
            max: MAX_DIE_SIDES,
        }
    })?;

    Ok(Term::Dice { sign, count, sides })
}

/// Parse a digit run that must land in `1..=max`.
///
/// Non-digits make the whole term invalid; a well-formed number outside the
/// bounds (including one too long to represent) is a range error.
fn parse_bounded(
    digits: &str,
    term: &str,
    max: u32,
    out_of_range: impl FnOnce(String) -> DiceError,
) -> DiceResult<u32> {
    if !is_digits(digits) {
        return Err(DiceError::InvalidTerm(term.to_string()));
    }
    match digits.parse::<u32>() {
        Ok(n) if (1..=max).contains(&n) => Ok(n),
        _ => Err(out_of_range(digits.to_string())),
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
