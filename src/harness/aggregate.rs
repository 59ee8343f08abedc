//! Suite scheduling and summary statistics.
//!
//! Test cases are independent, so the runner schedules them on a bounded
//! pool of scoped worker threads claiming indices from an atomic counter.
//! Each outcome lands in a per-test slot, which keeps the final outcome
//! sequence in suite order no matter which worker finishes first. All
//! statistics are derived afterwards by folding over the immutable outcome
//! sequence; nothing suite-wide is mutated while tests run.

use super::runner::TestCaseRunner;
use super::{TestOutcome, TestStatus};
use crate::provider::ExecutionProvider;
use crate::state::{Discrepancy, StackKind};
use crate::suite::{TestCase, TestSuite};
use crate::translate::DialectTranslator;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;
use tracing::{debug, info};

/// Failure-pattern label: a discrepancy records a provider failure.
pub const PATTERN_ERROR_HANDLING: &str = "Error handling";
/// Failure-pattern label: a discrepancy on the float stack.
pub const PATTERN_FLOAT_PRECISION: &str = "Float precision";
/// Failure-pattern label: the test name marks it as an overflow probe.
pub const PATTERN_INTEGER_OVERFLOW: &str = "Integer overflow";
/// Failure-pattern label: the candidate's result carries a NaN.
pub const PATTERN_SPECIAL_FLOATS: &str = "Special float values";
/// Failure-pattern label: none of the heuristics applied.
pub const PATTERN_UNKNOWN: &str = "Unknown";

/// Cooperative cancellation handle for a suite run. Cancelling stops the
/// pool from claiming new test cases; in-flight ones finish or time out so
/// no outcome is ever half-populated.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// True once cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-category totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStats {
    /// Category name.
    pub name: String,
    /// Tests in this category that produced an outcome.
    pub total: usize,
    /// Passed count.
    pub passed: usize,
    /// Failed count.
    pub failed: usize,
    /// Tooling-error count.
    pub errors: usize,
    /// Skipped count.
    pub skipped: usize,
    /// Passed over total, as a percentage.
    pub pass_rate: f64,
}

/// Suite-level statistics, derived entirely from the outcome sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuiteSummary {
    /// Total outcomes collected.
    pub total_tests: usize,
    /// Passed count.
    pub passed: usize,
    /// Failed count.
    pub failed: usize,
    /// Tooling-error count.
    pub errors: usize,
    /// Skipped count.
    pub skipped: usize,
    /// Passed over non-skipped, as a percentage.
    pub pass_rate: f64,
    /// Per-category breakdown, in suite order.
    pub categories: Vec<CategoryStats>,
    /// Failure-pattern histogram over failing outcomes.
    pub failure_patterns: BTreeMap<String, usize>,
    /// Mean candidate duration in seconds, over outcomes that carry timing.
    pub average_candidate_secs: Option<f64>,
    /// Mean reference duration in seconds, over outcomes that carry timing.
    pub average_reference_secs: Option<f64>,
    /// Reference average over candidate average.
    pub speedup: Option<f64>,
}

impl SuiteSummary {
    /// Fold a summary out of collected outcomes. `category_order` fixes the
    /// order of the per-category breakdown (outcomes of a cancelled run may
    /// not cover every category).
    pub fn from_outcomes(outcomes: &[TestOutcome], category_order: &[String]) -> Self {
        let count = |status: TestStatus| outcomes.iter().filter(|o| o.status == status).count();
        let passed = count(TestStatus::Pass);
        let failed = count(TestStatus::Fail);
        let errors = count(TestStatus::Error);
        let skipped = count(TestStatus::Skip);
        let total_tests = outcomes.len();

        let considered = total_tests - skipped;
        let pass_rate = if considered > 0 {
            passed as f64 / considered as f64 * 100.0
        } else {
            0.0
        };

        let categories = category_order
            .iter()
            .map(|name| {
                let of_status = |status: TestStatus| {
                    outcomes
                        .iter()
                        .filter(|o| o.category == *name && o.status == status)
                        .count()
                };
                let total = outcomes.iter().filter(|o| o.category == *name).count();
                let passed = of_status(TestStatus::Pass);
                CategoryStats {
                    name: name.clone(),
                    total,
                    passed,
                    failed: of_status(TestStatus::Fail),
                    errors: of_status(TestStatus::Error),
                    skipped: of_status(TestStatus::Skip),
                    pass_rate: if total > 0 {
                        passed as f64 / total as f64 * 100.0
                    } else {
                        0.0
                    },
                }
            })
            .collect();

        let mut failure_patterns = BTreeMap::new();
        for outcome in outcomes.iter().filter(|o| o.status == TestStatus::Fail) {
            for pattern in classify_failure(outcome) {
                *failure_patterns.entry(pattern.to_string()).or_insert(0) += 1;
            }
        }

        let average_candidate_secs = mean_secs(outcomes, |o| o.candidate_duration);
        let average_reference_secs = mean_secs(outcomes, |o| o.reference_duration);
        let speedup = match (average_candidate_secs, average_reference_secs) {
            (Some(candidate), Some(reference)) if candidate > 0.0 => Some(reference / candidate),
            _ => None,
        };

        Self {
            total_tests,
            passed,
            failed,
            errors,
            skipped,
            pass_rate,
            categories,
            failure_patterns,
            average_candidate_secs,
            average_reference_secs,
            speedup,
        }
    }
}

/// Coarse triage labels for one failing outcome, one per discrepancy. A
/// single outcome with discrepancies of different kinds feeds several
/// buckets.
pub fn classify_failure(outcome: &TestOutcome) -> Vec<&'static str> {
    let overflow_name = outcome.name.to_lowercase().contains("overflow");
    let nan_result = outcome
        .candidate_raw
        .as_deref()
        .is_some_and(|raw| raw.to_lowercase().contains("nan"));

    outcome
        .discrepancies
        .iter()
        .map(|d| match d {
            Discrepancy::Provider { .. } => PATTERN_ERROR_HANDLING,
            Discrepancy::Stack {
                stack: StackKind::Float,
                ..
            } => PATTERN_FLOAT_PRECISION,
            Discrepancy::Stack { .. } if overflow_name => PATTERN_INTEGER_OVERFLOW,
            Discrepancy::Stack { .. } if nan_result => PATTERN_SPECIAL_FLOATS,
            Discrepancy::Stack { .. } => PATTERN_UNKNOWN,
        })
        .collect()
}

fn mean_secs(
    outcomes: &[TestOutcome],
    pick: impl Fn(&TestOutcome) -> Option<std::time::Duration>,
) -> Option<f64> {
    let secs: Vec<f64> = outcomes
        .iter()
        .filter_map(|o| pick(o).map(|d| d.as_secs_f64()))
        .collect();
    if secs.is_empty() {
        None
    } else {
        Some(secs.iter().sum::<f64>() / secs.len() as f64)
    }
}

/// A completed suite run: outcomes in suite order plus the derived summary.
#[derive(Debug)]
pub struct SuiteRun {
    /// Outcomes in suite order. A cancelled run omits unissued tests.
    pub outcomes: Vec<TestOutcome>,
    /// Derived statistics.
    pub summary: SuiteSummary,
}

/// Schedules a whole suite over the shared translator and providers.
pub struct SuiteRunner {
    translator: DialectTranslator,
    candidate: ExecutionProvider,
    reference: ExecutionProvider,
    jobs: usize,
    cancel: CancelFlag,
}

impl SuiteRunner {
    /// Create a sequential suite runner.
    pub fn new(candidate: ExecutionProvider, reference: ExecutionProvider) -> Self {
        Self {
            translator: DialectTranslator::new(),
            candidate,
            reference,
            jobs: 1,
            cancel: CancelFlag::new(),
        }
    }

    /// Set the worker-pool width. `1` runs tests strictly in suite order.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Handle for cancelling this run from another thread.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Run every test in the suite. `on_outcome` fires as each test
    /// finishes (completion order); the returned sequence is in suite
    /// order regardless.
    pub fn run_suite(
        &self,
        suite: &TestSuite,
        on_outcome: &(dyn Fn(&TestOutcome) + Sync),
    ) -> SuiteRun {
        let tests: Vec<&TestCase> = suite.tests().collect();
        let slots: Vec<OnceLock<TestOutcome>> = tests.iter().map(|_| OnceLock::new()).collect();
        let next = AtomicUsize::new(0);
        let workers = self.jobs.min(tests.len()).max(1);

        info!(tests = tests.len(), workers, "starting suite run");
        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| {
                    let runner =
                        TestCaseRunner::new(&self.translator, &self.candidate, &self.reference);
                    loop {
                        if self.cancel.is_cancelled() {
                            debug!("cancellation requested, worker stopping");
                            break;
                        }
                        let index = next.fetch_add(1, Ordering::SeqCst);
                        let Some(test) = tests.get(index) else {
                            break;
                        };
                        let outcome = runner.run(test);
                        on_outcome(&outcome);
                        let _ = slots[index].set(outcome);
                    }
                });
            }
        });

        let outcomes: Vec<TestOutcome> = slots
            .into_iter()
            .filter_map(OnceLock::into_inner)
            .collect();
        let category_order: Vec<String> =
            suite.categories.iter().map(|c| c.name.clone()).collect();
        let summary = SuiteSummary::from_outcomes(&outcomes, &category_order);
        info!(
            passed = summary.passed,
            failed = summary.failed,
            errors = summary.errors,
            skipped = summary.skipped,
            "suite run finished"
        );
        SuiteRun { outcomes, summary }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Side;
    use std::time::Duration;

    fn outcome(
        name: &str,
        category: &str,
        status: TestStatus,
        discrepancies: Vec<Discrepancy>,
    ) -> TestOutcome {
        TestOutcome {
            name: name.to_string(),
            category: category.to_string(),
            program: String::new(),
            status,
            detail: None,
            discrepancies,
            expectation_mismatches: vec![],
            candidate_duration: None,
            reference_duration: None,
            candidate_raw: None,
            reference_raw: None,
        }
    }

    fn stack_diff(stack: StackKind) -> Discrepancy {
        Discrepancy::Stack {
            stack,
            candidate: "[1]".to_string(),
            reference: "[2]".to_string(),
            expected: None,
        }
    }

    #[test]
    fn test_status_totals_and_pass_rate() {
        let outcomes = vec![
            outcome("a", "cat1", TestStatus::Pass, vec![]),
            outcome("b", "cat1", TestStatus::Fail, vec![stack_diff(StackKind::Integer)]),
            outcome("c", "cat2", TestStatus::Skip, vec![]),
            outcome("d", "cat2", TestStatus::Error, vec![]),
        ];
        let order = vec!["cat1".to_string(), "cat2".to_string()];
        let summary = SuiteSummary::from_outcomes(&outcomes, &order);

        assert_eq!(summary.total_tests, 4);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.skipped, 1);
        // Skips are excluded from the denominator.
        assert!((summary.pass_rate - 100.0 / 3.0).abs() < 1e-9);

        assert_eq!(summary.categories.len(), 2);
        assert_eq!(summary.categories[0].name, "cat1");
        assert_eq!(summary.categories[0].passed, 1);
        assert_eq!(summary.categories[0].failed, 1);
        assert!((summary.categories[0].pass_rate - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_classify_provider_failure() {
        let o = outcome(
            "t",
            "c",
            TestStatus::Fail,
            vec![Discrepancy::Provider {
                side: Side::Reference,
                reason: "Execution timeout".to_string(),
            }],
        );
        assert_eq!(classify_failure(&o), vec![PATTERN_ERROR_HANDLING]);
    }

    #[test]
    fn test_classify_float_precision() {
        let o = outcome("t", "c", TestStatus::Fail, vec![stack_diff(StackKind::Float)]);
        assert_eq!(classify_failure(&o), vec![PATTERN_FLOAT_PRECISION]);
    }

    #[test]
    fn test_classify_overflow_by_name() {
        let o = outcome(
            "integer_overflow_max",
            "c",
            TestStatus::Fail,
            vec![stack_diff(StackKind::Integer)],
        );
        assert_eq!(classify_failure(&o), vec![PATTERN_INTEGER_OVERFLOW]);
    }

    #[test]
    fn test_classify_nan_bearing_result() {
        let mut o = outcome("t", "c", TestStatus::Fail, vec![stack_diff(StackKind::Boolean)]);
        o.candidate_raw = Some("Float stack: [NaN]".to_string());
        assert_eq!(classify_failure(&o), vec![PATTERN_SPECIAL_FLOATS]);
    }

    #[test]
    fn test_classify_unknown() {
        let o = outcome("t", "c", TestStatus::Fail, vec![stack_diff(StackKind::Integer)]);
        assert_eq!(classify_failure(&o), vec![PATTERN_UNKNOWN]);
    }

    #[test]
    fn test_one_outcome_feeds_multiple_buckets() {
        let o = outcome(
            "t",
            "c",
            TestStatus::Fail,
            vec![
                stack_diff(StackKind::Float),
                Discrepancy::Provider {
                    side: Side::Candidate,
                    reason: "boom".to_string(),
                },
            ],
        );
        let order: Vec<String> = vec!["c".to_string()];
        let summary = SuiteSummary::from_outcomes(&[o], &order);
        assert_eq!(summary.failure_patterns[PATTERN_FLOAT_PRECISION], 1);
        assert_eq!(summary.failure_patterns[PATTERN_ERROR_HANDLING], 1);
    }

    #[test]
    fn test_non_failing_outcomes_not_classified() {
        let o = outcome("t", "c", TestStatus::Error, vec![]);
        let summary = SuiteSummary::from_outcomes(&[o], &["c".to_string()]);
        assert!(summary.failure_patterns.is_empty());
    }

    #[test]
    fn test_timing_averages_and_speedup() {
        let mut a = outcome("a", "c", TestStatus::Pass, vec![]);
        a.candidate_duration = Some(Duration::from_millis(100));
        a.reference_duration = Some(Duration::from_millis(1000));
        let mut b = outcome("b", "c", TestStatus::Pass, vec![]);
        b.candidate_duration = Some(Duration::from_millis(300));
        b.reference_duration = Some(Duration::from_millis(3000));
        // A skip with no timing must not drag the averages down.
        let skip = outcome("s", "c", TestStatus::Skip, vec![]);

        let summary = SuiteSummary::from_outcomes(&[a, b, skip], &["c".to_string()]);
        let cand = summary.average_candidate_secs.unwrap();
        let refr = summary.average_reference_secs.unwrap();
        assert!((cand - 0.2).abs() < 1e-9);
        assert!((refr - 2.0).abs() < 1e-9);
        assert!((summary.speedup.unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_timing_data() {
        let summary = SuiteSummary::from_outcomes(
            &[outcome("s", "c", TestStatus::Skip, vec![])],
            &["c".to_string()],
        );
        assert!(summary.average_candidate_secs.is_none());
        assert!(summary.speedup.is_none());
    }
}
