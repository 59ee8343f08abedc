//! Result artifacts and human-readable test reports.
//!
//! The artifact is a single JSON document with a summary record and the
//! full per-test outcome sequence, enough to audit any disagreement after
//! the run without re-executing either interpreter.

use crate::error::{HarnessError, HarnessResult};
use crate::harness::{SuiteSummary, TestOutcome};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

#[derive(Serialize)]
struct Artifact<'a> {
    summary: &'a SuiteSummary,
    results: &'a [TestOutcome],
}

/// Write the result artifact as pretty-printed JSON.
pub fn write_artifact(
    path: &Path,
    summary: &SuiteSummary,
    outcomes: &[TestOutcome],
) -> HarnessResult<()> {
    let report_err = |reason: String| HarnessError::Report {
        path: path.display().to_string(),
        reason,
    };
    let artifact = Artifact {
        summary,
        results: outcomes,
    };
    let json = serde_json::to_string_pretty(&artifact).map_err(|e| report_err(e.to_string()))?;
    fs::write(path, json).map_err(|e| report_err(e.to_string()))
}

/// Format one outcome as a detailed human-readable block, raw payloads
/// included.
pub fn outcome_report(outcome: &TestOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Test Report ===");
    let _ = writeln!(out, "Test: {}", outcome.name);
    let _ = writeln!(out, "Category: {}", outcome.category);
    let _ = writeln!(out, "Status: {}", outcome.status.to_string().to_uppercase());
    let _ = writeln!(out, "Program: {}", outcome.program);
    if let Some(detail) = &outcome.detail {
        let _ = writeln!(out, "Detail: {detail}");
    }
    if !outcome.discrepancies.is_empty() {
        let _ = writeln!(out, "\nDifferences:");
        for d in &outcome.discrepancies {
            let _ = writeln!(out, "  - {d}");
        }
    }
    if !outcome.expectation_mismatches.is_empty() {
        let _ = writeln!(out, "\nExpectation mismatches:");
        for m in &outcome.expectation_mismatches {
            let _ = writeln!(out, "  - {m}");
        }
    }
    if let (Some(candidate), Some(reference)) =
        (outcome.candidate_duration, outcome.reference_duration)
    {
        let _ = writeln!(
            out,
            "\nCandidate time: {:.3}s\nReference time: {:.3}s",
            candidate.as_secs_f64(),
            reference.as_secs_f64()
        );
    }
    if let Some(raw) = &outcome.candidate_raw {
        let _ = writeln!(out, "\nCandidate output:\n{}", raw.trim_end());
    }
    if let Some(raw) = &outcome.reference_raw {
        let _ = writeln!(out, "\nReference output:\n{}", raw.trim_end());
    }
    out
}
