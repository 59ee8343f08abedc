//! Equivalence rules for two execution outcomes.
//!
//! Equivalence is defined at the "both sides reject the program" level: any
//! combination of failure and timeout on both sides is a match, regardless
//! of message content. When both sides succeed, integer and boolean stacks
//! compare exactly; float stacks compare element-wise with NaN equal to NaN,
//! same-signed infinities equal, and finite values equal within an absolute
//! tolerance.

use crate::state::{
    Discrepancy, ExecutionOutcome, ExpectationMismatch, Side, StackKind, StackState,
};

/// Absolute tolerance for finite float comparison.
pub const FLOAT_TOLERANCE: f64 = 1e-10;

/// Outcome of comparing the two sides, plus any disagreement with a
/// hand-authored expected state. Expectation mismatches never affect
/// `matched`: a test may show agreement between the two implementations
/// while both disagree with the expectation.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// True when the two implementations agree.
    pub matched: bool,
    /// One record per disagreement between the implementations.
    pub discrepancies: Vec<Discrepancy>,
    /// Per-side disagreements with the expected state, when one is declared.
    pub expectation_mismatches: Vec<ExpectationMismatch>,
}

/// Compare the candidate and reference outcomes, optionally also checking
/// each successful side against an expected state.
pub fn compare(
    candidate: &ExecutionOutcome,
    reference: &ExecutionOutcome,
    expected: Option<&StackState>,
) -> Comparison {
    let mut discrepancies = Vec::new();

    match (candidate, reference) {
        (ExecutionOutcome::Success(c), ExecutionOutcome::Success(r)) => {
            if c.integers != r.integers {
                discrepancies.push(Discrepancy::Stack {
                    stack: StackKind::Integer,
                    candidate: c.integer_list(),
                    reference: r.integer_list(),
                    expected: expected.map(StackState::integer_list),
                });
            }
            if !floats_equivalent(&c.floats, &r.floats) {
                discrepancies.push(Discrepancy::Stack {
                    stack: StackKind::Float,
                    candidate: c.float_list(),
                    reference: r.float_list(),
                    expected: expected.map(StackState::float_list),
                });
            }
            if c.booleans != r.booleans {
                discrepancies.push(Discrepancy::Stack {
                    stack: StackKind::Boolean,
                    candidate: c.boolean_list(),
                    reference: r.boolean_list(),
                    expected: expected.map(StackState::boolean_list),
                });
            }
        }
        (ExecutionOutcome::Success(_), failed) => {
            discrepancies.push(Discrepancy::Provider {
                side: Side::Reference,
                reason: failed.describe(),
            });
        }
        (failed, ExecutionOutcome::Success(_)) => {
            discrepancies.push(Discrepancy::Provider {
                side: Side::Candidate,
                reason: failed.describe(),
            });
        }
        // Both sides rejected the program: a match by definition.
        _ => {}
    }

    let mut expectation_mismatches = Vec::new();
    if let Some(expected) = expected {
        if let ExecutionOutcome::Success(state) = candidate {
            check_expected(Side::Candidate, state, expected, &mut expectation_mismatches);
        }
        if let ExecutionOutcome::Success(state) = reference {
            check_expected(Side::Reference, state, expected, &mut expectation_mismatches);
        }
    }

    Comparison {
        matched: discrepancies.is_empty(),
        discrepancies,
        expectation_mismatches,
    }
}

/// Check one side against the expected state with the same per-kind rules
/// as the cross-implementation comparison.
fn check_expected(
    side: Side,
    state: &StackState,
    expected: &StackState,
    out: &mut Vec<ExpectationMismatch>,
) {
    if state.integers != expected.integers {
        out.push(ExpectationMismatch {
            stack: StackKind::Integer,
            side,
            actual: state.integer_list(),
            expected: expected.integer_list(),
        });
    }
    if !floats_equivalent(&state.floats, &expected.floats) {
        out.push(ExpectationMismatch {
            stack: StackKind::Float,
            side,
            actual: state.float_list(),
            expected: expected.float_list(),
        });
    }
    if state.booleans != expected.booleans {
        out.push(ExpectationMismatch {
            stack: StackKind::Boolean,
            side,
            actual: state.boolean_list(),
            expected: expected.boolean_list(),
        });
    }
}

/// Element-wise float stack equivalence. Differing lengths never match.
fn floats_equivalent(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| float_eq(*x, *y))
}

/// NaN equals NaN; an infinity equals only the same-signed infinity;
/// finite values are equal within [`FLOAT_TOLERANCE`].
fn float_eq(a: f64, b: f64) -> bool {
    if a.is_nan() && b.is_nan() {
        return true;
    }
    if a.is_infinite() || b.is_infinite() {
        return a == b;
    }
    (a - b).abs() <= FLOAT_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success(integers: Vec<i64>, floats: Vec<f64>, booleans: Vec<bool>) -> ExecutionOutcome {
        ExecutionOutcome::Success(StackState {
            integers,
            floats,
            booleans,
        })
    }

    #[test]
    fn test_identical_states_match() {
        let a = success(vec![7], vec![1.5], vec![true]);
        let b = success(vec![7], vec![1.5], vec![true]);
        let result = compare(&a, &b, None);
        assert!(result.matched);
        assert!(result.discrepancies.is_empty());
    }

    #[test]
    fn test_integer_disagreement() {
        let a = success(vec![8], vec![], vec![]);
        let b = success(vec![7], vec![], vec![]);
        let result = compare(&a, &b, None);
        assert!(!result.matched);
        assert_eq!(result.discrepancies.len(), 1);
        assert!(matches!(
            &result.discrepancies[0],
            Discrepancy::Stack {
                stack: StackKind::Integer,
                ..
            }
        ));
    }

    #[test]
    fn test_float_within_tolerance() {
        let a = success(vec![], vec![1.0], vec![]);
        let b = success(vec![], vec![1.0 + 5e-11], vec![]);
        assert!(compare(&a, &b, None).matched);
    }

    #[test]
    fn test_float_outside_tolerance() {
        let a = success(vec![], vec![1.0], vec![]);
        let b = success(vec![], vec![1.0 + 2e-10], vec![]);
        assert!(!compare(&a, &b, None).matched);
    }

    #[test]
    fn test_nan_equals_nan() {
        let a = success(vec![], vec![f64::NAN], vec![]);
        let b = success(vec![], vec![f64::NAN], vec![]);
        assert!(compare(&a, &b, None).matched);
    }

    #[test]
    fn test_infinity_signs() {
        let pos = success(vec![], vec![f64::INFINITY], vec![]);
        let pos2 = success(vec![], vec![f64::INFINITY], vec![]);
        let neg = success(vec![], vec![f64::NEG_INFINITY], vec![]);
        assert!(compare(&pos, &pos2, None).matched);
        assert!(!compare(&pos, &neg, None).matched);
    }

    #[test]
    fn test_nan_vs_infinity_mismatch() {
        let a = success(vec![], vec![f64::NAN], vec![]);
        let b = success(vec![], vec![f64::INFINITY], vec![]);
        assert!(!compare(&a, &b, None).matched);
    }

    #[test]
    fn test_length_mismatch() {
        let a = success(vec![], vec![1.0, 2.0], vec![]);
        let b = success(vec![], vec![1.0], vec![]);
        assert!(!compare(&a, &b, None).matched);
    }

    #[test]
    fn test_both_failures_match() {
        let a = ExecutionOutcome::Failure("division by zero".to_string());
        let b = ExecutionOutcome::Failure("stack underflow".to_string());
        let result = compare(&a, &b, None);
        assert!(result.matched);
        assert!(result.discrepancies.is_empty());
    }

    #[test]
    fn test_failure_and_timeout_match() {
        let a = ExecutionOutcome::Failure("boom".to_string());
        let b = ExecutionOutcome::Timeout;
        assert!(compare(&a, &b, None).matched);
        assert!(compare(&b, &a, None).matched);
    }

    #[test]
    fn test_one_side_failed_is_mismatch() {
        let ok = success(vec![7], vec![], vec![]);
        let failed = ExecutionOutcome::Failure("boom".to_string());
        let result = compare(&ok, &failed, None);
        assert!(!result.matched);
        assert_eq!(
            result.discrepancies,
            vec![Discrepancy::Provider {
                side: Side::Reference,
                reason: "boom".to_string(),
            }]
        );

        let result = compare(&failed, &ok, None);
        assert_eq!(
            result.discrepancies,
            vec![Discrepancy::Provider {
                side: Side::Candidate,
                reason: "boom".to_string(),
            }]
        );
    }

    #[test]
    fn test_symmetric_modulo_direction() {
        let cases = [
            (success(vec![7], vec![], vec![]), success(vec![8], vec![], vec![])),
            (
                success(vec![], vec![1.0], vec![]),
                success(vec![], vec![1.0 + 5e-11], vec![]),
            ),
            (
                ExecutionOutcome::Timeout,
                ExecutionOutcome::Failure("x".to_string()),
            ),
            (success(vec![], vec![], vec![true]), ExecutionOutcome::Timeout),
        ];
        for (a, b) in cases {
            assert_eq!(compare(&a, &b, None).matched, compare(&b, &a, None).matched);
        }
    }

    #[test]
    fn test_expectation_mismatch_is_non_fatal() {
        // Both implementations produce [8]; the test author expected [7].
        let expected = StackState {
            integers: vec![7],
            ..StackState::default()
        };
        let a = success(vec![8], vec![], vec![]);
        let b = success(vec![8], vec![], vec![]);
        let result = compare(&a, &b, Some(&expected));
        assert!(result.matched);
        assert!(result.discrepancies.is_empty());
        assert_eq!(result.expectation_mismatches.len(), 2);
        assert_eq!(result.expectation_mismatches[0].side, Side::Candidate);
        assert_eq!(result.expectation_mismatches[1].side, Side::Reference);
    }

    #[test]
    fn test_expectation_uses_float_tolerance() {
        let expected = StackState {
            floats: vec![1.0],
            ..StackState::default()
        };
        let a = success(vec![], vec![1.0 + 5e-11], vec![]);
        let result = compare(&a, &a.clone(), Some(&expected));
        assert!(result.expectation_mismatches.is_empty());
    }

    #[test]
    fn test_expectation_not_checked_for_failed_side() {
        let expected = StackState {
            integers: vec![7],
            ..StackState::default()
        };
        let failed = ExecutionOutcome::Failure("boom".to_string());
        let result = compare(&failed, &failed.clone(), Some(&expected));
        assert!(result.matched);
        assert!(result.expectation_mismatches.is_empty());
    }
}
