//! Subprocess backend for one interpreter under test.
//!
//! An [`ExecutionProvider`] owns the command line of one external
//! interpreter and runs one process per invocation: spawn with the program
//! as the final argument, capture stdout/stderr on reader threads, poll the
//! child against a deadline, and kill and reap it if the deadline passes. A
//! timed-out child is never left running and never holds the harness open.
//!
//! The provider does not interpret stack contents; raw stdout is handed
//! unmodified to [`crate::output::parse`].

use crate::error::{HarnessError, HarnessResult};
use crate::state::Side;
use std::io::Read;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How often a running child is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// An external interpreter invocation: executable plus fixed leading
/// arguments. The program under test is appended as one extra argument.
#[derive(Debug, Clone)]
pub struct InterpreterCommand {
    /// Executable name or path.
    pub program: String,
    /// Fixed arguments placed before the Push program.
    pub args: Vec<String>,
}

impl InterpreterCommand {
    /// Parse a whitespace-separated command line, e.g.
    /// `"clojure -M -m test-runner"`. No shell quoting is interpreted.
    pub fn parse(spec: &str) -> HarnessResult<Self> {
        let mut parts = spec.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or_else(|| {
            HarnessError::Internal("interpreter command line is empty".to_string())
        })?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }
}

/// How one provider invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderStatus {
    /// Zero exit status; stdout carries the final-state payload.
    Completed,
    /// Nonzero exit, spawn failure, or wait failure.
    Failed(String),
    /// Deadline exceeded; the child was killed and reaped.
    TimedOut,
}

/// One provider invocation: status, the raw stdout payload, and the
/// wall-clock duration of the run.
#[derive(Debug, Clone)]
pub struct ProviderRun {
    /// How the invocation ended.
    pub status: ProviderStatus,
    /// Captured stdout, untouched. Still populated on failure or timeout
    /// with whatever the child wrote before dying, for audit.
    pub raw_stdout: String,
    /// Wall-clock time from spawn to exit or kill.
    pub duration: Duration,
}

/// Runs programs on one external interpreter, one process per call. No
/// state is shared between calls.
#[derive(Debug, Clone)]
pub struct ExecutionProvider {
    side: Side,
    command: InterpreterCommand,
    timeout: Duration,
}

impl ExecutionProvider {
    /// Create a provider for one side.
    pub fn new(side: Side, command: InterpreterCommand, timeout: Duration) -> Self {
        Self {
            side,
            command,
            timeout,
        }
    }

    /// Which side this provider runs.
    pub fn side(&self) -> Side {
        self.side
    }

    /// Run one program. Spawn and wait faults are folded into
    /// [`ProviderStatus::Failed`]; this never returns a harness error.
    pub fn run(&self, program: &str) -> ProviderRun {
        let start = Instant::now();

        debug!(side = %self.side, program = %self.command.program, "spawning interpreter");
        let mut child = match Command::new(&self.command.program)
            .args(&self.command.args)
            .arg(program)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                return ProviderRun {
                    status: ProviderStatus::Failed(format!(
                        "failed to spawn {}: {e}",
                        self.command.program
                    )),
                    raw_stdout: String::new(),
                    duration: start.elapsed(),
                }
            }
        };

        // Drain both pipes on their own threads so a chatty child can never
        // deadlock against a full pipe buffer while we poll for exit.
        let stdout_reader = spawn_reader(child.stdout.take());
        let stderr_reader = spawn_reader(child.stderr.take());

        let wait = loop {
            match child.try_wait() {
                Ok(Some(status)) => break Wait::Exited(status.code()),
                Ok(None) => {
                    if start.elapsed() >= self.timeout {
                        warn!(side = %self.side, "interpreter exceeded timeout, killing");
                        let _ = child.kill();
                        // Reap after kill so the child cannot become a zombie.
                        let _ = child.wait();
                        break Wait::TimedOut;
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    break Wait::Fault(e.to_string());
                }
            }
        };

        let raw_stdout = join_reader(stdout_reader);
        let stderr = join_reader(stderr_reader);
        let duration = start.elapsed();

        let status = match wait {
            Wait::Exited(code) if code == Some(0) => ProviderStatus::Completed,
            Wait::Exited(code) => ProviderStatus::Failed(failure_message(code, &stderr)),
            Wait::TimedOut => ProviderStatus::TimedOut,
            Wait::Fault(msg) => ProviderStatus::Failed(format!("failed to wait for child: {msg}")),
        };

        debug!(side = %self.side, ?status, elapsed_ms = duration.as_millis() as u64, "interpreter finished");
        ProviderRun {
            status,
            raw_stdout,
            duration,
        }
    }
}

enum Wait {
    Exited(Option<i32>),
    TimedOut,
    Fault(String),
}

/// Failure message derived from stderr, falling back to the exit status.
fn failure_message(code: Option<i32>, stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        match code {
            Some(code) => format!("Execution failed: exit status {code}"),
            None => "Execution failed: terminated by signal".to_string(),
        }
    } else {
        format!("Execution failed: {stderr}")
    }
}

fn spawn_reader<R: Read + Send + 'static>(source: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    source.map(|mut r| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = r.read_to_end(&mut buf);
            buf
        })
    })
}

fn join_reader(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|buf| String::from_utf8_lossy(&buf).into_owned())
        .unwrap_or_default()
}
