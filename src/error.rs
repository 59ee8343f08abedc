//! Error handling for the harness.
//!
//! Provider-level failures and timeouts are *not* errors: they are expected
//! execution outcomes folded into the comparison logic. The variants here
//! cover genuine tooling faults, which the test-case runner converts into
//! `Error`-status outcomes so a single bad test never aborts a suite run.

use thiserror::Error;

/// Result type for harness operations.
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Errors raised by the harness itself (as opposed to the interpreters
/// under test).
#[derive(Debug, Clone, Error)]
pub enum HarnessError {
    /// Interpreter output did not match any recognized shape, or a value
    /// token could not be converted to the expected type.
    #[error("parse error: {0}")]
    Parse(String),

    /// A dialect rewrite rule was structurally invalid. Must not occur for
    /// well-formed programs; propagated rather than passing corrupted text
    /// downstream.
    #[error("translation error: {0}")]
    Translation(String),

    /// The suite description file could not be read or decoded.
    #[error("failed to load suite {path}: {reason}")]
    SuiteLoad {
        /// Path of the suite file.
        path: String,
        /// What went wrong.
        reason: String,
    },

    /// The result artifact could not be written.
    #[error("failed to write report {path}: {reason}")]
    Report {
        /// Path of the artifact.
        path: String,
        /// What went wrong.
        reason: String,
    },

    /// Any other unexpected fault inside the harness.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let e = HarnessError::Parse("no final-state marker".to_string());
        assert_eq!(e.to_string(), "parse error: no final-state marker");

        let e = HarnessError::SuiteLoad {
            path: "suite.json".to_string(),
            reason: "missing field `program`".to_string(),
        };
        assert!(e.to_string().contains("suite.json"));
        assert!(e.to_string().contains("missing field"));
    }
}
