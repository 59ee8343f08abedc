//! Differential testing harness for Push3 interpreter implementations.
//!
//! Runs the same program on two external interpreters, the candidate (the
//! implementation under validation) and the reference (a trusted baseline),
//! and reports whether their observable final stack states agree.
//!
//! # Architecture
//!
//! Data flows strictly downward through the modules:
//!
//! - [`translate`] - candidate-to-reference instruction vocabulary rewrite
//! - [`provider`] - bounded-timeout subprocess execution of one interpreter
//! - [`output`] - parsing of both output dialects into canonical state
//! - [`compare`] - tolerance-aware equivalence of two execution outcomes
//! - [`harness`] - per-test orchestration and suite aggregation
//! - [`suite`] - suite description loading
//! - [`report`] - result artifacts and human-readable reports
//! - [`state`] - the canonical data model shared by all of the above
//! - [`error`] - the harness error taxonomy
//!
//! The harness never executes the language itself; it observes two opaque
//! interpreter processes and reports on agreement.

// The suite must always complete and report; library code propagates
// errors instead of panicking. Tests are exempt via clippy.toml.
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]

pub mod compare;
pub mod error;
pub mod harness;
pub mod output;
pub mod provider;
pub mod report;
pub mod state;
pub mod suite;
pub mod translate;

// Re-export commonly used types
pub use compare::{compare, Comparison, FLOAT_TOLERANCE};
pub use error::{HarnessError, HarnessResult};
pub use harness::{
    CancelFlag, SuiteRun, SuiteRunner, SuiteSummary, TestCaseRunner, TestOutcome, TestStatus,
};
pub use provider::{ExecutionProvider, InterpreterCommand, ProviderRun, ProviderStatus};
pub use state::{
    Discrepancy, ExecutionOutcome, ExpectationMismatch, Side, StackKind, StackState,
};
pub use suite::{SuiteCategory, TestCase, TestSuite};
pub use translate::DialectTranslator;
