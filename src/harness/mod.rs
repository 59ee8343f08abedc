//! Differential test harness: per-test orchestration and suite aggregation.
//!
//! [`runner::TestCaseRunner`] drives one test case end to end (translate,
//! run both interpreters, parse, compare) and folds tooling faults into
//! `Error`-status outcomes. [`aggregate::SuiteRunner`] schedules a whole
//! categorized suite and derives summary statistics from the immutable
//! outcome sequence.

pub mod aggregate;
pub mod runner;

pub use aggregate::{
    CancelFlag, CategoryStats, SuiteRun, SuiteRunner, SuiteSummary, PATTERN_ERROR_HANDLING,
    PATTERN_FLOAT_PRECISION, PATTERN_INTEGER_OVERFLOW, PATTERN_SPECIAL_FLOATS, PATTERN_UNKNOWN,
};
pub use runner::TestCaseRunner;

use crate::state::{Discrepancy, ExpectationMismatch};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Final status of one test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    /// The implementations agree.
    Pass,
    /// The implementations disagree.
    Fail,
    /// A tooling fault (parse, translation, internal), not a disagreement.
    Error,
    /// The test was skipped without invoking either interpreter.
    Skip,
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => write!(f, "pass"),
            Self::Fail => write!(f, "fail"),
            Self::Error => write!(f, "error"),
            Self::Skip => write!(f, "skip"),
        }
    }
}

/// Everything recorded about one test case run. Immutable once produced;
/// the artifact reproduces it in full so any disagreement can be audited
/// without re-executing.
#[derive(Debug, Clone, Serialize)]
pub struct TestOutcome {
    /// Test name.
    pub name: String,
    /// Category the test belongs to.
    pub category: String,
    /// Program in the candidate's dialect.
    pub program: String,
    /// Final status.
    pub status: TestStatus,
    /// Skip reason or tooling-error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Disagreements between the implementations.
    pub discrepancies: Vec<Discrepancy>,
    /// Non-fatal disagreements with the hand-authored expected state.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub expectation_mismatches: Vec<ExpectationMismatch>,
    /// Wall-clock time of the candidate run, when it ran.
    #[serde(with = "duration_secs")]
    pub candidate_duration: Option<Duration>,
    /// Wall-clock time of the reference run, when it ran.
    #[serde(with = "duration_secs")]
    pub reference_duration: Option<Duration>,
    /// Raw candidate stdout, when it ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_raw: Option<String>,
    /// Raw reference stdout, when it ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_raw: Option<String>,
}

impl TestOutcome {
    /// True when this outcome carries an expectation-mismatch flag.
    pub fn expectation_mismatched(&self) -> bool {
        !self.expectation_mismatches.is_empty()
    }
}

/// Serialize an optional duration as fractional seconds, the unit the
/// original comparison artifacts used.
mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&d.as_secs_f64()),
            None => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        assert_eq!(TestStatus::Pass.to_string(), "pass");
        assert_eq!(TestStatus::Skip.to_string(), "skip");
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = TestOutcome {
            name: "add_basic".to_string(),
            category: "edge_cases".to_string(),
            program: "3 4 INTEGER.+".to_string(),
            status: TestStatus::Pass,
            detail: None,
            discrepancies: vec![],
            expectation_mismatches: vec![],
            candidate_duration: Some(Duration::from_millis(125)),
            reference_duration: None,
            candidate_raw: Some("Integer stack: [7]".to_string()),
            reference_raw: None,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "pass");
        assert_eq!(json["candidate_duration"], 0.125);
        assert!(json["reference_duration"].is_null());
        assert!(json.get("detail").is_none());
    }
}
