//! Canonical state types shared by the whole harness.
//!
//! A [`StackState`] is the unified in-memory representation of an
//! interpreter's final stack contents, independent of either interpreter's
//! output formatting. Both output dialects render from and parse to this one
//! type, which is what makes the comparison well-defined.
//!
//! Discrepancy values are carried as rendered list text rather than raw
//! floats so that NaN and the infinities survive the JSON result artifact.

use serde::Serialize;
use std::fmt;

/// Which typed stack a value or disagreement belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StackKind {
    /// The signed integer stack.
    Integer,
    /// The floating-point stack.
    Float,
    /// The boolean stack.
    Boolean,
}

impl fmt::Display for StackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => write!(f, "integer"),
            Self::Float => write!(f, "float"),
            Self::Boolean => write!(f, "boolean"),
        }
    }
}

/// Which interpreter a record refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The implementation under validation.
    Candidate,
    /// The trusted baseline implementation.
    Reference,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Candidate => write!(f, "candidate"),
            Self::Reference => write!(f, "reference"),
        }
    }
}

/// Final contents of the three typed stacks. Position 0 is the top of the
/// corresponding stack.
///
/// `PartialEq` is raw structural equality (NaN != NaN); tolerant float
/// comparison lives in [`crate::compare`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StackState {
    /// Integer stack, top first.
    pub integers: Vec<i64>,
    /// Float stack, top first. May hold NaN and the infinities.
    pub floats: Vec<f64>,
    /// Boolean stack, top first.
    pub booleans: Vec<bool>,
}

impl StackState {
    /// True when all three stacks are empty.
    pub fn is_empty(&self) -> bool {
        self.integers.is_empty() && self.floats.is_empty() && self.booleans.is_empty()
    }

    /// True when the float stack holds at least one NaN.
    pub fn has_nan(&self) -> bool {
        self.floats.iter().any(|v| v.is_nan())
    }

    /// Integer stack as list text, e.g. `[3, 7]`.
    pub fn integer_list(&self) -> String {
        let items: Vec<String> = self.integers.iter().map(ToString::to_string).collect();
        format!("[{}]", items.join(", "))
    }

    /// Float stack as list text in the candidate's notation, e.g.
    /// `[1.5, inf, NaN]`.
    pub fn float_list(&self) -> String {
        let items: Vec<String> = self.floats.iter().map(|v| format_float(*v)).collect();
        format!("[{}]", items.join(", "))
    }

    /// Boolean stack as list text, e.g. `[true, false]`.
    pub fn boolean_list(&self) -> String {
        let items: Vec<String> = self.booleans.iter().map(ToString::to_string).collect();
        format!("[{}]", items.join(", "))
    }

    /// Render in the candidate interpreter's delimited plain-text dialect.
    pub fn to_plain_text(&self) -> String {
        format!(
            "=== FINAL STATE ===\nInteger stack: {}\nFloat stack: {}\nBoolean stack: {}\n",
            self.integer_list(),
            self.float_list(),
            self.boolean_list()
        )
    }

    /// Render in the reference interpreter's single-line record dialect.
    /// Special floats use the Python-style `Infinity`/`-Infinity`/`NaN`
    /// spellings the reference emits.
    pub fn to_record_line(&self) -> String {
        let floats: Vec<String> = self
            .floats
            .iter()
            .map(|v| {
                if v.is_nan() {
                    "NaN".to_string()
                } else if *v == f64::INFINITY {
                    "Infinity".to_string()
                } else if *v == f64::NEG_INFINITY {
                    "-Infinity".to_string()
                } else {
                    format!("{v:?}")
                }
            })
            .collect();
        let ints: Vec<String> = self.integers.iter().map(ToString::to_string).collect();
        let bools: Vec<String> = self.booleans.iter().map(ToString::to_string).collect();
        format!(
            "{{\"integer\": [{}], \"float\": [{}], \"boolean\": [{}]}}",
            ints.join(", "),
            floats.join(", "),
            bools.join(", ")
        )
    }
}

/// Format one float the way the candidate interpreter prints it: `inf`,
/// `-inf`, `NaN`, otherwise the shortest round-trippable decimal.
pub fn format_float(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v == f64::INFINITY {
        "inf".to_string()
    } else if v == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{v:?}")
    }
}

/// Result of running one program on one interpreter. Every invocation
/// produces exactly one of these; there is no partial state.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// The interpreter exited cleanly and its output parsed.
    Success(StackState),
    /// The interpreter reported an error (nonzero exit).
    Failure(String),
    /// The interpreter exceeded the time limit and was killed.
    Timeout,
}

impl ExecutionOutcome {
    /// True for [`ExecutionOutcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The final stack state, if the run succeeded.
    pub fn state(&self) -> Option<&StackState> {
        match self {
            Self::Success(state) => Some(state),
            _ => None,
        }
    }

    /// Human-readable description of a non-success outcome.
    pub fn describe(&self) -> String {
        match self {
            Self::Success(_) => "success".to_string(),
            Self::Failure(reason) => reason.clone(),
            Self::Timeout => "Execution timeout".to_string(),
        }
    }
}

/// One recorded disagreement between the two implementations.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Discrepancy {
    /// Exactly one side failed or timed out.
    Provider {
        /// The side that failed.
        side: Side,
        /// The failing side's reason.
        reason: String,
    },
    /// Both sides succeeded but one stack disagrees.
    Stack {
        /// Which stack disagrees.
        stack: StackKind,
        /// Candidate's stack, rendered as list text.
        candidate: String,
        /// Reference's stack, rendered as list text.
        reference: String,
        /// Hand-authored expected stack, when the test declares one.
        #[serde(skip_serializing_if = "Option::is_none")]
        expected: Option<String>,
    },
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provider { side, reason } => write!(f, "{side} error: {reason}"),
            Self::Stack {
                stack,
                candidate,
                reference,
                expected,
            } => {
                write!(f, "{stack} stack: candidate={candidate}, reference={reference}")?;
                if let Some(expected) = expected {
                    write!(f, ", expected={expected}")?;
                }
                Ok(())
            }
        }
    }
}

/// A side's disagreement with the hand-authored expected state. Non-fatal:
/// the two implementations can agree with each other while both disagree
/// with the expectation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpectationMismatch {
    /// Which stack disagrees with the expectation.
    pub stack: StackKind,
    /// Which side is being checked.
    pub side: Side,
    /// That side's stack, rendered as list text.
    pub actual: String,
    /// The expected stack, rendered as list text.
    pub expected: String,
}

impl fmt::Display for ExpectationMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} stack: {}={}, expected={}",
            self.stack, self.side, self.actual, self.expected
        )
    }
}
