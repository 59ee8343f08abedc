//! CLI integration tests.
//!
//! Tests the pushdiff CLI by invoking the binary as a subprocess.

#![cfg(unix)]

use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

fn pushdiff_path() -> PathBuf {
    // Find the pushdiff binary in the target directory
    let mut path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_default();

    // Navigate to the deps directory's sibling (the main binary location)
    if path.ends_with("deps") {
        path.pop();
    }

    path.join("pushdiff")
}

fn run_cli(args: &[&str]) -> (i32, String, String) {
    let binary = pushdiff_path();
    let output = Command::new(&binary)
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to spawn pushdiff at {binary:?}: {e}"));

    let code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (code, stdout, stderr)
}

/// Fake interpreters agreeing on one program and diverging on another.
fn write_fixtures(dir: &TempDir) -> (String, String, String) {
    let candidate = dir.path().join("candidate.sh");
    fs::write(
        &candidate,
        r#"#!/bin/sh
case "$1" in
"3 4 INTEGER.+")
  printf '=== FINAL STATE ===\nInteger stack: [7]\nFloat stack: []\nBoolean stack: []\n' ;;
"2 2 INTEGER.*")
  printf '=== FINAL STATE ===\nInteger stack: [5]\nFloat stack: []\nBoolean stack: []\n' ;;
*)
  echo "unknown program" >&2; exit 64 ;;
esac
"#,
    )
    .unwrap();

    let reference = dir.path().join("reference.sh");
    fs::write(
        &reference,
        r#"#!/bin/sh
case "$1" in
"3 4 integer_add")
  echo '{"integer": [7], "float": [], "boolean": []}' ;;
"2 2 integer_mult")
  echo '{"integer": [4], "float": [], "boolean": []}' ;;
*)
  echo "unknown program" >&2; exit 64 ;;
esac
"#,
    )
    .unwrap();

    let suite = dir.path().join("suite.json");
    fs::write(
        &suite,
        r#"{
    "arithmetic": [
        {"name": "add_basic", "program": "3 4 INTEGER.+"},
        {"name": "mult_divergent", "program": "2 2 INTEGER.*"}
    ]
}"#,
    )
    .unwrap();

    (
        format!("sh {}", candidate.display()),
        format!("sh {}", reference.display()),
        suite.display().to_string(),
    )
}

// ============================================================================
// Run Command Tests
// ============================================================================

#[test]
fn cli_run_reports_and_writes_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let (candidate, reference, suite) = write_fixtures(&dir);
    let output = dir.path().join("results.json");

    let output_arg = output.display().to_string();
    let (code, stdout, _stderr) = run_cli(&[
        "run",
        "--suite",
        suite.as_str(),
        "--candidate",
        candidate.as_str(),
        "--reference",
        reference.as_str(),
        "--output",
        output_arg.as_str(),
    ]);

    // One divergent test: the run completes but exits nonzero.
    assert_ne!(code, 0);
    assert!(stdout.contains("SUITE SUMMARY"), "{stdout}");
    assert!(stdout.contains("Results match"), "{stdout}");
    assert!(stdout.contains("Results differ"), "{stdout}");

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(value["summary"]["passed"], 1);
    assert_eq!(value["summary"]["failed"], 1);
}

#[test]
fn cli_run_missing_suite_fails() {
    let (code, _stdout, stderr) = run_cli(&["run", "--suite", "/nonexistent-suite-7f3a.json"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("failed to load suite"), "{stderr}");
}

// ============================================================================
// Test Command Tests
// ============================================================================

#[test]
fn cli_single_test_detailed_report() {
    let dir = tempfile::tempdir().unwrap();
    let (candidate, reference, suite) = write_fixtures(&dir);

    let (code, stdout, _stderr) = run_cli(&[
        "test",
        "add_basic",
        "--suite",
        suite.as_str(),
        "--candidate",
        candidate.as_str(),
        "--reference",
        reference.as_str(),
    ]);

    assert_eq!(code, 0, "{stdout}");
    assert!(stdout.contains("Running single test: add_basic"));
    assert!(stdout.contains("Status: PASS"));
    assert!(stdout.contains("Candidate output:"));
}

#[test]
fn cli_unknown_test_lists_names_by_category() {
    let dir = tempfile::tempdir().unwrap();
    let (_candidate, _reference, suite) = write_fixtures(&dir);

    let (code, stdout, _stderr) = run_cli(&["test", "no_such_test", "--suite", suite.as_str()]);

    assert_ne!(code, 0);
    assert!(stdout.contains("Test 'no_such_test' not found"));
    assert!(stdout.contains("arithmetic:"));
    assert!(stdout.contains("- add_basic"));
    assert!(stdout.contains("- mult_divergent"));
}
