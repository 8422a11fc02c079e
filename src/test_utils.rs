//! Shared test utilities for the release action.

use crate::deps::{CommandExecutor, CommandLine};
use crate::error::{ReleaseError, Result};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::process::{ExitStatus, Output};

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code.unsigned_abs())
}

/// Creates a successful command `Output` with empty stdout and stderr.
#[must_use]
pub fn success_output() -> Output {
    stdout_output("")
}

/// Creates a successful command `Output` with the given stdout.
#[must_use]
pub fn stdout_output(stdout: &str) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.as_bytes().to_vec(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
#[must_use]
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The command to execute (e.g., "cargo").
    pub cmd: &'static str,
    /// The arguments to pass to the command.
    pub args: Vec<String>,
    /// The result to return when this command is invoked.
    pub result: Result<Output>,
}

impl ExpectedCall {
    /// Expect `cmd args...` and answer with `result`.
    #[must_use]
    pub fn new(cmd: &'static str, args: &[&str], result: Result<Output>) -> Self {
        Self {
            cmd,
            args: args.iter().map(|&a| a.to_owned()).collect(),
            result,
        }
    }
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Records expected command invocations and returns predefined results,
/// allowing tests to verify command execution without side effects. Every
/// received [`CommandLine`] is kept for later inspection of environment
/// overrides.
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
    received: RefCell<Vec<CommandLine>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    #[must_use]
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
            received: RefCell::new(Vec::new()),
        }
    }

    /// Returns every command received so far.
    #[must_use]
    pub fn received(&self) -> Vec<CommandLine> {
        self.received.borrow().clone()
    }

    /// Asserts that all expected command invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        let remaining = self.expected.borrow();
        assert!(
            remaining.is_empty(),
            "expected no further command invocations, {} left: {:?}",
            remaining.len(),
            remaining.front().map(|c| (c.cmd, &c.args))
        );
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, command: &CommandLine) -> Result<Output> {
        self.received.borrow_mut().push(command.clone());
        let Some(call) = self.expected.borrow_mut().pop_front() else {
            return Err(ReleaseError::StubMismatch {
                message: format!("unexpected command invocation: {command}"),
            });
        };

        if call.cmd != command.program() || call.args.as_slice() != command.arguments() {
            return Err(ReleaseError::StubMismatch {
                message: format!(
                    "expected `{} {}`, got `{command}`",
                    call.cmd,
                    call.args.join(" ")
                ),
            });
        }

        call.result
    }
}
