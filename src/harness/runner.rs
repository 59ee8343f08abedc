//! End-to-end execution of one test case.
//!
//! The runner translates the program for the reference side only (the
//! candidate runs the untranslated program), invokes both providers
//! concurrently, parses both outputs, and compares. Tooling faults (parse
//! errors, translation errors, panicked provider threads) become
//! `Error`-status outcomes here so they can never abort the surrounding
//! suite run.

use super::{TestOutcome, TestStatus};
use crate::compare::compare;
use crate::error::HarnessError;
use crate::output;
use crate::provider::{ExecutionProvider, ProviderRun, ProviderStatus};
use crate::state::{ExecutionOutcome, Side};
use crate::suite::TestCase;
use crate::translate::DialectTranslator;
use std::thread;
use tracing::debug;

/// Runs one test case against both interpreters.
pub struct TestCaseRunner<'a> {
    translator: &'a DialectTranslator,
    candidate: &'a ExecutionProvider,
    reference: &'a ExecutionProvider,
}

impl<'a> TestCaseRunner<'a> {
    /// Create a runner over the shared translator and providers.
    pub fn new(
        translator: &'a DialectTranslator,
        candidate: &'a ExecutionProvider,
        reference: &'a ExecutionProvider,
    ) -> Self {
        Self {
            translator,
            candidate,
            reference,
        }
    }

    /// Run one test case. Never fails: every fault maps to a status.
    pub fn run(&self, test: &TestCase) -> TestOutcome {
        if test.program.trim().is_empty() {
            return skipped(test, "empty program");
        }

        let translated = match self.translator.translate(&test.program) {
            Ok(translated) => translated,
            Err(e) => return tool_error(test, e.to_string(), None, None),
        };

        // The two invocations have no data dependency; run them in
        // parallel and join at the comparator.
        let (candidate_run, reference_run) = thread::scope(|scope| {
            let candidate = scope.spawn(|| self.candidate.run(&test.program));
            let reference = self.reference.run(&translated);
            (candidate.join(), reference)
        });
        let candidate_run = match candidate_run {
            Ok(run) => run,
            Err(_) => {
                return tool_error(
                    test,
                    HarnessError::Internal("candidate runner thread panicked".to_string())
                        .to_string(),
                    None,
                    Some(&reference_run),
                )
            }
        };

        let candidate_outcome = match resolve(Side::Candidate, &candidate_run) {
            Ok(outcome) => outcome,
            Err(e) => {
                return tool_error(test, e.to_string(), Some(&candidate_run), Some(&reference_run))
            }
        };
        let reference_outcome = match resolve(Side::Reference, &reference_run) {
            Ok(outcome) => outcome,
            Err(e) => {
                return tool_error(test, e.to_string(), Some(&candidate_run), Some(&reference_run))
            }
        };

        let comparison = compare(&candidate_outcome, &reference_outcome, test.expected.as_ref());
        let status = if comparison.matched {
            TestStatus::Pass
        } else {
            TestStatus::Fail
        };
        debug!(test = %test.name, %status, "test case finished");

        TestOutcome {
            name: test.name.clone(),
            category: test.category.clone(),
            program: test.program.clone(),
            status,
            detail: None,
            discrepancies: comparison.discrepancies,
            expectation_mismatches: comparison.expectation_mismatches,
            candidate_duration: Some(candidate_run.duration),
            reference_duration: Some(reference_run.duration),
            candidate_raw: Some(candidate_run.raw_stdout),
            reference_raw: Some(reference_run.raw_stdout),
        }
    }
}

/// Map one provider run to an execution outcome, parsing stdout on clean
/// exit. Parse failures surface as harness errors for the caller to fold
/// into an `Error`-status outcome.
fn resolve(side: Side, run: &ProviderRun) -> Result<ExecutionOutcome, HarnessError> {
    match &run.status {
        ProviderStatus::Completed => match output::parse(&run.raw_stdout) {
            Ok(state) => Ok(ExecutionOutcome::Success(state)),
            Err(HarnessError::Parse(msg)) => {
                Err(HarnessError::Parse(format!("{side} output: {msg}")))
            }
            Err(other) => Err(other),
        },
        ProviderStatus::Failed(reason) => Ok(ExecutionOutcome::Failure(reason.clone())),
        ProviderStatus::TimedOut => Ok(ExecutionOutcome::Timeout),
    }
}

fn skipped(test: &TestCase, reason: &str) -> TestOutcome {
    TestOutcome {
        name: test.name.clone(),
        category: test.category.clone(),
        program: test.program.clone(),
        status: TestStatus::Skip,
        detail: Some(reason.to_string()),
        discrepancies: vec![],
        expectation_mismatches: vec![],
        candidate_duration: None,
        reference_duration: None,
        candidate_raw: None,
        reference_raw: None,
    }
}

fn tool_error(
    test: &TestCase,
    message: String,
    candidate: Option<&ProviderRun>,
    reference: Option<&ProviderRun>,
) -> TestOutcome {
    TestOutcome {
        name: test.name.clone(),
        category: test.category.clone(),
        program: test.program.clone(),
        status: TestStatus::Error,
        detail: Some(message),
        discrepancies: vec![],
        expectation_mismatches: vec![],
        candidate_duration: candidate.map(|r| r.duration),
        reference_duration: reference.map(|r| r.duration),
        candidate_raw: candidate.map(|r| r.raw_stdout.clone()),
        reference_raw: reference.map(|r| r.raw_stdout.clone()),
    }
}
