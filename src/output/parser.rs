//! Dialect-aware parser for interpreter output.
//!
//! Recognizes the candidate's delimited plain-text section and the
//! reference's single-line record, producing a canonical [`StackState`].
//! Parsing is pure and total over well-formed input; malformed input fails
//! fast with a descriptive error instead of defaulting to an empty state.

use super::lexer::{Lexer, Token};
use crate::error::{HarnessError, HarnessResult};
use crate::state::{StackKind, StackState};

/// Marker line opening the candidate's final-state section.
pub const FINAL_STATE_MARKER: &str = "=== FINAL STATE ===";

const INTEGER_LABEL: &str = "Integer stack:";
const FLOAT_LABEL: &str = "Float stack:";
const BOOLEAN_LABEL: &str = "Boolean stack:";

/// Parse raw interpreter output into a canonical stack state.
///
/// Shape detection, in order: a `=== FINAL STATE ===` marker (labeled lines
/// are read from the section after it), labeled stack lines without the
/// marker, then a line starting with `{` (the record dialect). Anything
/// else is a parse error.
pub fn parse(raw: &str) -> HarnessResult<StackState> {
    let lines: Vec<&str> = raw.lines().collect();

    if let Some(idx) = lines.iter().position(|l| l.contains(FINAL_STATE_MARKER)) {
        return parse_labeled(&lines[idx + 1..]);
    }
    if lines.iter().any(|l| l.contains(INTEGER_LABEL)) {
        return parse_labeled(&lines);
    }
    if let Some(line) = lines.iter().map(|l| l.trim()).find(|l| l.starts_with('{')) {
        return parse_record(line);
    }

    Err(HarnessError::Parse(
        "no final-state marker or stack record in output".to_string(),
    ))
}

/// Parse the three labeled list-literal lines of the plain-text dialect.
/// All three stack lines must be present; the candidate always prints them.
fn parse_labeled(lines: &[&str]) -> HarnessResult<StackState> {
    Ok(StackState {
        integers: parse_list(list_after(lines, INTEGER_LABEL)?, StackKind::Integer)?.0,
        floats: parse_list(list_after(lines, FLOAT_LABEL)?, StackKind::Float)?.1,
        booleans: parse_list(list_after(lines, BOOLEAN_LABEL)?, StackKind::Boolean)?.2,
    })
}

/// Find the text after a stack label, e.g. `[3, 7]` from
/// `Integer stack: [3, 7]`.
fn list_after<'a>(lines: &[&'a str], label: &str) -> HarnessResult<&'a str> {
    for line in lines {
        if let Some(idx) = line.find(label) {
            return Ok(line[idx + label.len()..].trim());
        }
    }
    Err(HarnessError::Parse(format!("missing `{label}` line")))
}

/// Parse one bracketed list literal into the slot matching `kind`. Returns
/// all three vectors so the caller can pick by kind without generics; the
/// other two are always empty.
#[allow(clippy::type_complexity)]
fn parse_list(text: &str, kind: StackKind) -> HarnessResult<(Vec<i64>, Vec<f64>, Vec<bool>)> {
    let mut lexer = Lexer::new(text);
    if lexer.next_token()? != Token::LeftBracket {
        return Err(HarnessError::Parse(format!(
            "{kind} stack is not a list literal: `{text}`"
        )));
    }
    let (ints, floats, bools, next) = parse_values(&mut lexer, kind)?;
    // The list must be the whole payload of its line.
    if next != Token::RightBracket {
        return Err(HarnessError::Parse(format!(
            "malformed {kind} stack list: `{text}`"
        )));
    }
    if lexer.next_token()? != Token::Eof {
        return Err(HarnessError::Parse(format!(
            "trailing content after {kind} stack list: `{text}`"
        )));
    }
    Ok((ints, floats, bools))
}

/// Parse comma-separated values up to (but not consuming past) the closing
/// bracket. Returns the token that ended the sequence.
#[allow(clippy::type_complexity)]
fn parse_values(
    lexer: &mut Lexer<'_>,
    kind: StackKind,
) -> HarnessResult<(Vec<i64>, Vec<f64>, Vec<bool>, Token)> {
    let mut ints = Vec::new();
    let mut floats = Vec::new();
    let mut bools = Vec::new();

    let mut token = lexer.next_token()?;
    if token == Token::RightBracket {
        // Empty-list notation maps to an empty stack, not an error.
        return Ok((ints, floats, bools, token));
    }

    loop {
        match (kind, &token) {
            (StackKind::Integer, Token::Integer(v)) => ints.push(*v),
            (StackKind::Float, Token::Float(v)) => floats.push(*v),
            // Whole-valued floats may print without a fractional part.
            (StackKind::Float, Token::Integer(v)) => floats.push(*v as f64),
            (StackKind::Boolean, Token::Bool(v)) => bools.push(*v),
            _ => {
                return Err(HarnessError::Parse(format!(
                    "{kind} stack holds a non-{kind} value: {token:?}"
                )))
            }
        }
        match lexer.next_token()? {
            Token::Comma => token = lexer.next_token()?,
            other => return Ok((ints, floats, bools, other)),
        }
    }
}

/// Parse the single-line record dialect. Missing keys default to empty
/// stacks, matching the reference runner's habit of omitting them.
fn parse_record(line: &str) -> HarnessResult<StackState> {
    let mut lexer = Lexer::new(line);
    if lexer.next_token()? != Token::LeftBrace {
        return Err(HarnessError::Parse(
            "record output does not start with `{`".to_string(),
        ));
    }

    let mut state = StackState::default();

    let mut token = lexer.next_token()?;
    if token == Token::RightBrace {
        return finish_record(&mut lexer, state);
    }

    loop {
        let key = match &token {
            Token::Str(key) => key.clone(),
            other => {
                return Err(HarnessError::Parse(format!(
                    "expected a quoted key in record output, found {other:?}"
                )))
            }
        };
        let kind = match key.as_str() {
            "integer" => StackKind::Integer,
            "float" => StackKind::Float,
            "boolean" => StackKind::Boolean,
            other => {
                return Err(HarnessError::Parse(format!(
                    "unknown key `{other}` in record output"
                )))
            }
        };

        if lexer.next_token()? != Token::Colon {
            return Err(HarnessError::Parse(format!(
                "expected `:` after key `{key}`"
            )));
        }
        if lexer.next_token()? != Token::LeftBracket {
            return Err(HarnessError::Parse(format!(
                "value of `{key}` is not a sequence"
            )));
        }
        let (ints, floats, bools, next) = parse_values(&mut lexer, kind)?;
        if next != Token::RightBracket {
            return Err(HarnessError::Parse(format!(
                "malformed sequence for key `{key}`"
            )));
        }
        match kind {
            StackKind::Integer => state.integers = ints,
            StackKind::Float => state.floats = floats,
            StackKind::Boolean => state.booleans = bools,
        }

        match lexer.next_token()? {
            Token::Comma => token = lexer.next_token()?,
            Token::RightBrace => return finish_record(&mut lexer, state),
            other => {
                return Err(HarnessError::Parse(format!(
                    "expected `,` or `}}` in record output, found {other:?}"
                )))
            }
        }
    }
}

fn finish_record(lexer: &mut Lexer<'_>, state: StackState) -> HarnessResult<StackState> {
    if lexer.next_token()? != Token::Eof {
        return Err(HarnessError::Parse(
            "trailing content after record output".to_string(),
        ));
    }
    Ok(state)
}
