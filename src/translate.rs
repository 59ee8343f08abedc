//! Dialect translation between the two interpreters' instruction
//! vocabularies.
//!
//! The candidate interpreter names instructions `INTEGER.+`, `FLOAT.DUP`,
//! `BOOLEAN.NOT`; the reference names the same operations `integer_add`,
//! `float_dup`, `boolean_not`. Translation rewrites whole whitespace-delimited
//! tokens, never substrings, so `INTEGER.DUP2` can never be corrupted by the
//! `INTEGER.DUP` rule. Some candidate instructions have no single-token
//! reference equivalent and expand into a short token sequence; expansions
//! are emitted directly and never rescanned.

use crate::error::{HarnessError, HarnessResult};
use std::collections::BTreeMap;

/// Rewrite table: candidate token to reference token sequence.
///
/// Multi-token expansions cover instructions the reference spells as a
/// literal plus a generic form (`INTEGER.DUP2` pushes the count 2 and then
/// duplicates that many items).
const REWRITES: &[(&str, &[&str])] = &[
    ("INTEGER.+", &["integer_add"]),
    ("INTEGER.-", &["integer_sub"]),
    ("INTEGER.*", &["integer_mult"]),
    ("INTEGER./", &["integer_div"]),
    ("INTEGER.%", &["integer_mod"]),
    ("INTEGER.DUP", &["integer_dup"]),
    ("INTEGER.DUP2", &["2", "integer_dup_items"]),
    ("INTEGER.DDUP", &["2", "integer_dup_items"]),
    ("INTEGER.SWAP", &["integer_swap"]),
    ("INTEGER.ROT", &["integer_rot"]),
    ("INTEGER.POP", &["integer_pop"]),
    ("INTEGER.DROP", &["integer_pop"]),
    ("INTEGER.=", &["integer_eq"]),
    ("INTEGER.<", &["integer_lt"]),
    ("INTEGER.>", &["integer_gt"]),
    ("FLOAT.+", &["float_add"]),
    ("FLOAT.-", &["float_sub"]),
    ("FLOAT.*", &["float_mult"]),
    ("FLOAT./", &["float_div"]),
    ("FLOAT.%", &["float_mod"]),
    ("FLOAT.DUP", &["float_dup"]),
    ("FLOAT.SWAP", &["float_swap"]),
    ("FLOAT.ROT", &["float_rot"]),
    ("FLOAT.POP", &["float_pop"]),
    ("FLOAT.=", &["float_eq"]),
    ("FLOAT.<", &["float_lt"]),
    ("FLOAT.>", &["float_gt"]),
    ("BOOLEAN.AND", &["boolean_and"]),
    ("BOOLEAN.OR", &["boolean_or"]),
    ("BOOLEAN.NOT", &["boolean_not"]),
    ("BOOLEAN.=", &["boolean_eq"]),
    ("BOOLEAN.DUP", &["boolean_dup"]),
    ("BOOLEAN.DUP2", &["2", "boolean_dup_items"]),
    ("BOOLEAN.SWAP", &["boolean_swap"]),
    ("BOOLEAN.ROT", &["boolean_rot"]),
    ("BOOLEAN.POP", &["boolean_pop"]),
    ("TRUE", &["true"]),
    ("FALSE", &["false"]),
];

/// Token-level translator from the candidate's vocabulary to the
/// reference's. Deterministic and side-effect free.
#[derive(Debug, Clone)]
pub struct DialectTranslator {
    rules: BTreeMap<&'static str, &'static [&'static str]>,
}

impl DialectTranslator {
    /// Build a translator with the built-in rewrite table.
    pub fn new() -> Self {
        Self::with_rules(REWRITES)
    }

    /// Build a translator with a custom rewrite table. Used by tests;
    /// production code uses [`DialectTranslator::new`].
    pub fn with_rules(rules: &'static [(&'static str, &'static [&'static str])]) -> Self {
        Self {
            rules: rules.iter().copied().collect(),
        }
    }

    /// Rewrite a whole program. Unknown tokens (numeric literals, unmapped
    /// instruction names) pass through unchanged. Whitespace is normalized
    /// to single spaces, which both interpreters treat as equivalent.
    pub fn translate(&self, program: &str) -> HarnessResult<String> {
        let mut out: Vec<&str> = Vec::new();
        for token in program.split_whitespace() {
            match self.rules.get(token) {
                Some(expansion) => {
                    if expansion.is_empty() {
                        return Err(HarnessError::Translation(format!(
                            "rewrite rule for `{token}` expands to nothing"
                        )));
                    }
                    out.extend_from_slice(expansion);
                }
                None => out.push(token),
            }
        }
        Ok(out.join(" "))
    }
}

impl Default for DialectTranslator {
    fn default() -> Self {
        Self::new()
    }
}
