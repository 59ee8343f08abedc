//! Pushdiff CLI.
//!
//! Runs a categorized differential test suite against two external Push3
//! interpreters, or a single named test case with a detailed report.

use clap::{Args, Parser, Subcommand};
use pushdiff::{
    report, DialectTranslator, ExecutionProvider, HarnessError, InterpreterCommand, Side,
    SuiteRunner, TestCaseRunner, TestOutcome, TestStatus, TestSuite,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "pushdiff")]
#[command(about = "Differential testing harness for Push3 interpreters", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct ExecutionOptions {
    /// Suite description file
    #[arg(long, default_value = "test_suite.json")]
    suite: PathBuf,

    /// Candidate interpreter command line; the program is appended as the
    /// final argument
    #[arg(long, default_value = "cargo run --quiet --")]
    candidate: String,

    /// Reference interpreter command line; the translated program is
    /// appended as the final argument
    #[arg(long, default_value = "clojure -M -m test-runner")]
    reference: String,

    /// Timeout per interpreter invocation, in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the whole suite and write the result artifact
    Run {
        #[command(flatten)]
        options: ExecutionOptions,

        /// Number of test cases to run concurrently
        #[arg(long, default_value_t = 1)]
        jobs: usize,

        /// Result artifact path
        #[arg(long, default_value = "test_results.json")]
        output: PathBuf,
    },

    /// Run one named test case and print its detailed outcome
    Test {
        /// Test name as listed in the suite file
        name: String,

        #[command(flatten)]
        options: ExecutionOptions,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run {
            options,
            jobs,
            output,
        } => run_suite(&options, jobs, &output),
        Commands::Test { name, options } => run_single(&name, &options),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn build_providers(
    options: &ExecutionOptions,
) -> Result<(ExecutionProvider, ExecutionProvider), HarnessError> {
    let timeout = Duration::from_secs(options.timeout);
    let candidate = ExecutionProvider::new(
        Side::Candidate,
        InterpreterCommand::parse(&options.candidate)?,
        timeout,
    );
    let reference = ExecutionProvider::new(
        Side::Reference,
        InterpreterCommand::parse(&options.reference)?,
        timeout,
    );
    Ok((candidate, reference))
}

fn run_suite(
    options: &ExecutionOptions,
    jobs: usize,
    output: &PathBuf,
) -> Result<ExitCode, HarnessError> {
    println!("Loading tests from {}", options.suite.display());
    let suite = TestSuite::load(&options.suite)?;
    println!(
        "Found {} tests in {} categories",
        suite.test_count(),
        suite.categories.len()
    );

    let (candidate, reference) = build_providers(options)?;
    let runner = SuiteRunner::new(candidate, reference).with_jobs(jobs);

    let last_category: Mutex<String> = Mutex::new(String::new());
    let print_progress = |outcome: &TestOutcome| {
        if let Ok(mut last) = last_category.lock() {
            if *last != outcome.category {
                println!("\n{}", "=".repeat(80));
                println!("CATEGORY: {}", outcome.category);
                println!("{}", "=".repeat(80));
                last.clone_from(&outcome.category);
            }
        }
        let description = suite
            .find(&outcome.name)
            .and_then(|t| t.description.clone())
            .unwrap_or_default();
        println!("\n{}: {description}", outcome.name);
        print_status_lines(outcome);
    };

    let run = runner.run_suite(&suite, &print_progress);

    print_summary(&run.summary);
    report::write_artifact(output, &run.summary, &run.outcomes)?;
    println!("\nDetailed results saved to {}", output.display());

    if run.summary.failed == 0 && run.summary.errors == 0 {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn run_single(name: &str, options: &ExecutionOptions) -> Result<ExitCode, HarnessError> {
    let suite = TestSuite::load(&options.suite)?;

    let Some(test) = suite.find(name) else {
        println!("Test '{name}' not found");
        println!("\nAvailable tests:");
        for category in &suite.categories {
            println!("\n{}:", category.name);
            for test in &category.tests {
                println!("  - {}", test.name);
            }
        }
        return Ok(ExitCode::FAILURE);
    };

    println!("Running single test: {name}");
    println!("Category: {}", test.category);
    if let Some(description) = &test.description {
        println!("Description: {description}");
    }

    let (candidate, reference) = build_providers(options)?;
    let translator = DialectTranslator::new();
    let runner = TestCaseRunner::new(&translator, &candidate, &reference);
    let outcome = runner.run(test);

    println!("\n{}", report::outcome_report(&outcome));

    match outcome.status {
        TestStatus::Pass | TestStatus::Skip => Ok(ExitCode::SUCCESS),
        TestStatus::Fail | TestStatus::Error => Ok(ExitCode::FAILURE),
    }
}

fn print_status_lines(outcome: &TestOutcome) {
    match outcome.status {
        TestStatus::Pass => println!("  ✓ Results match"),
        TestStatus::Fail => {
            println!("  ✗ Results differ:");
            for d in &outcome.discrepancies {
                println!("    {d}");
            }
        }
        TestStatus::Error => {
            let detail = outcome.detail.as_deref().unwrap_or("unknown fault");
            println!("  ⚠ Harness error: {detail}");
        }
        TestStatus::Skip => println!("  ⚠ Skipping empty program"),
    }
    if outcome.expectation_mismatched() {
        println!("  ⚠ Warning: does not match expected result");
        for m in &outcome.expectation_mismatches {
            println!("    {m}");
        }
    }
}

fn print_summary(summary: &pushdiff::SuiteSummary) {
    println!("\n{}", "=".repeat(80));
    println!("SUITE SUMMARY");
    println!("{}", "=".repeat(80));
    println!("Total tests: {}", summary.total_tests);
    println!("Passed: {} ({:.1}%)", summary.passed, summary.pass_rate);
    println!("Failed: {}", summary.failed);
    println!("Errors: {}", summary.errors);
    println!("Skipped: {}", summary.skipped);

    if !summary.categories.is_empty() {
        println!("\nBy category:");
        for stats in &summary.categories {
            println!(
                "  {}: {}/{} ({:.1}%)",
                stats.name, stats.passed, stats.total, stats.pass_rate
            );
        }
    }

    if !summary.failure_patterns.is_empty() {
        println!("\nFailure patterns:");
        let mut patterns: Vec<(&String, &usize)> = summary.failure_patterns.iter().collect();
        patterns.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (pattern, count) in patterns {
            println!("  {pattern}: {count}");
        }
    }

    if let (Some(candidate), Some(reference)) = (
        summary.average_candidate_secs,
        summary.average_reference_secs,
    ) {
        println!("\nPerformance:");
        println!("  Average candidate time: {candidate:.3}s");
        println!("  Average reference time: {reference:.3}s");
        if let Some(speedup) = summary.speedup {
            println!("  Candidate is {speedup:.1}x faster");
        }
    }
}
