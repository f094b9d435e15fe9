//! Test utilities and mocks for extforge unit tests.
//!
//! [`MockRunner`] stands in for the real process runner: it answers commands
//! from a list of expectations and records every invocation, so tests can
//! assert that a stage was (or was never) reached.
//!
//! # Example
//!
//! ```rust,ignore
//! use extforge::test_support::{tool_outputs, MockRunner};
//!
//! let runner = MockRunner::new();
//! runner.expect_prefix("cmake --version", tool_outputs::cmake_version("3.22.1"));
//! // ... run a stage with &runner ...
//! assert_eq!(runner.calls(), ["cmake --version"]);
//! ```

pub mod fixtures;

use std::io;
use std::sync::Mutex;

use crate::util::process::{CommandRunner, ProcessBuilder, ProcessOutput};

pub use fixtures::*;

/// Mock process output for testing command execution.
#[derive(Debug, Clone)]
pub struct MockProcessOutput {
    /// Exit status code (0 = success).
    pub status: i32,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

impl MockProcessOutput {
    /// Create a successful output with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        MockProcessOutput {
            status: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Create a failure output with the given stderr and status code.
    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        MockProcessOutput {
            status,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Create an output with both stdout and stderr.
    pub fn with_output(status: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        MockProcessOutput {
            status,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    fn to_output(&self) -> ProcessOutput {
        ProcessOutput {
            code: Some(self.status),
            stdout: self.stdout.clone(),
            stderr: self.stderr.clone(),
        }
    }
}

impl Default for MockProcessOutput {
    fn default() -> Self {
        MockProcessOutput::success("")
    }
}

/// Pattern for matching commands in [`MockRunner`].
#[derive(Debug, Clone)]
pub enum CommandPattern {
    /// Exact match on full command string.
    Exact(String),
    /// Match if command starts with prefix.
    StartsWith(String),
    /// Match any command.
    Any,
}

impl CommandPattern {
    /// Check if this pattern matches the given command.
    pub fn matches(&self, cmd: &str) -> bool {
        match self {
            CommandPattern::Exact(s) => cmd.trim_end() == s,
            CommandPattern::StartsWith(s) => cmd.starts_with(s),
            CommandPattern::Any => true,
        }
    }
}

/// What a matched command does.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// The process runs and produces this output.
    Output(MockProcessOutput),
    /// The process cannot be launched.
    NotFound,
}

/// Expectation for a command execution.
#[derive(Debug, Clone)]
pub struct CommandExpectation {
    /// Pattern to match against commands.
    pub pattern: CommandPattern,
    /// Response when matched.
    pub response: MockResponse,
}

#[derive(Debug, Default)]
struct MockState {
    expectations: Vec<CommandExpectation>,
    calls: Vec<ProcessBuilder>,
}

/// Mock process runner that records invocations.
///
/// Expectations are checked in insertion order; the first match wins.
/// Unmatched commands behave as if the program does not exist.
#[derive(Debug, Default)]
pub struct MockRunner {
    state: Mutex<MockState>,
}

impl MockRunner {
    /// Create a new mock runner with no expectations.
    pub fn new() -> Self {
        MockRunner::default()
    }

    /// Add an expectation.
    pub fn expect(&self, pattern: CommandPattern, response: MockResponse) -> &Self {
        self.state
            .lock()
            .unwrap()
            .expectations
            .push(CommandExpectation { pattern, response });
        self
    }

    /// Respond to commands starting with `prefix`.
    pub fn expect_prefix(&self, prefix: &str, output: MockProcessOutput) -> &Self {
        self.expect(
            CommandPattern::StartsWith(prefix.to_string()),
            MockResponse::Output(output),
        )
    }

    /// Make `program` impossible to launch.
    pub fn expect_not_found(&self, program: &str) -> &Self {
        self.expect(
            CommandPattern::StartsWith(format!("{} ", program)),
            MockResponse::NotFound,
        )
    }

    /// Rendered command lines of every invocation, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .map(ProcessBuilder::display_command)
            .collect()
    }

    /// Number of recorded invocations whose command line starts with `prefix`.
    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    /// Clear all recorded calls.
    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, cmd: &ProcessBuilder) -> io::Result<ProcessOutput> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(cmd.clone());

        // Match with a trailing space so `expect_not_found("swig")` also
        // catches a bare `swig` with no arguments.
        let line = format!("{} ", cmd.display_command());
        let response = state
            .expectations
            .iter()
            .find(|exp| exp.pattern.matches(&line))
            .map(|exp| exp.response.clone());

        match response {
            Some(MockResponse::Output(output)) => Ok(output.to_output()),
            Some(MockResponse::NotFound) | None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("mock: no such program `{}`", cmd.get_program().display()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_matching_expectation_wins() {
        let runner = MockRunner::new();
        runner.expect_prefix("cmake --build", MockProcessOutput::failure(2, "boom"));
        runner.expect_prefix("cmake", MockProcessOutput::success("ok"));

        let build = runner
            .run(&ProcessBuilder::new("cmake").args(["--build", "/b"]))
            .unwrap();
        let configure = runner
            .run(&ProcessBuilder::new("cmake").args(["-S", "/s"]))
            .unwrap();

        assert_eq!(build.code, Some(2));
        assert!(configure.success());
        assert_eq!(runner.calls(), ["cmake --build /b", "cmake -S /s"]);
    }

    #[test]
    fn test_unmatched_command_is_not_found() {
        let runner = MockRunner::new();
        let err = runner.run(&ProcessBuilder::new("swig")).unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn test_count_prefix() {
        let runner = MockRunner::new();
        runner.expect(CommandPattern::Any, MockResponse::Output(MockProcessOutput::default()));
        runner.run(&ProcessBuilder::new("cmake").arg("--version")).unwrap();
        runner.run(&ProcessBuilder::new("swig").arg("-version")).unwrap();

        assert_eq!(runner.count_prefix("cmake"), 1);
        runner.clear_calls();
        assert_eq!(runner.count_prefix("cmake"), 0);
    }
}
