//! Toolchain health checks.
//!
//! Unlike `extforge build`, which stops at the first unsatisfied requirement,
//! `extforge doctor` checks every requirement and reports all of them.
//!
//! ## Usage
//!
//! ```bash
//! extforge doctor           # Quick check
//! extforge doctor --verbose # Paths, versions and hints
//! ```
//!
//! ## Checks Performed
//!
//! - Every toolchain requirement (cmake, swig, python3 by default)
//! - The interpreter's extension suffix (required on macOS)
//! - Ninja (optional; only used with `generator = "Ninja"`)

use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::builder::error::PipelineError;
use crate::builder::toolchain::{probe_ext_suffix, ToolchainVerifier};
use crate::core::platform::HostPlatform;
use crate::core::requirement::ToolchainRequirement;
use crate::util::process::{find_executable, CommandRunner};

/// Result of a single health check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the check
    pub name: String,

    /// Whether the check passed
    pub passed: bool,

    /// Human-readable status message
    pub message: String,

    /// Path to the tool (if applicable)
    pub path: Option<PathBuf>,

    /// Version string (if applicable)
    pub version: Option<String>,

    /// Remediation for a failed check
    pub hint: Option<String>,

    /// How long the check took
    pub duration: Duration,

    /// Whether this check is required or optional
    pub required: bool,
}

impl CheckResult {
    /// Create a passing check result.
    pub fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            name: name.into(),
            passed: true,
            message: message.into(),
            path: None,
            version: None,
            hint: None,
            duration: Duration::ZERO,
            required: true,
        }
    }

    /// Create a failing check result.
    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            passed: false,
            ..CheckResult::pass(name, message)
        }
    }

    /// Mark this check as optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_path(mut self, path: Option<PathBuf>) -> Self {
        self.path = path;
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Summary of all health checks.
#[derive(Debug, Clone, Default)]
pub struct DoctorReport {
    /// Individual check results
    pub checks: Vec<CheckResult>,

    /// Total time taken
    pub total_duration: Duration,

    /// Environment information
    pub environment: BTreeMap<String, String>,
}

impl DoctorReport {
    pub fn new() -> Self {
        DoctorReport::default()
    }

    pub fn add(&mut self, check: CheckResult) {
        self.checks.push(check);
    }

    /// Check if all required checks passed.
    pub fn all_required_passed(&self) -> bool {
        self.checks.iter().filter(|c| c.required).all(|c| c.passed)
    }

    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }

    pub fn required_failed_count(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.required && !c.passed)
            .count()
    }
}

/// Options for the doctor command.
#[derive(Debug, Clone)]
pub struct DoctorOptions {
    pub platform: HostPlatform,

    /// Interpreter probed for its extension suffix
    pub interpreter: String,
}

impl Default for DoctorOptions {
    fn default() -> Self {
        DoctorOptions {
            platform: HostPlatform::host(),
            interpreter: "python3".to_string(),
        }
    }
}

/// Check every requirement, never stopping early.
pub fn doctor<R: CommandRunner>(
    requirements: &[ToolchainRequirement],
    runner: &R,
    options: &DoctorOptions,
) -> DoctorReport {
    let start = Instant::now();
    let mut report = DoctorReport::new();

    report
        .environment
        .insert("os".to_string(), std::env::consts::OS.to_string());
    report
        .environment
        .insert("arch".to_string(), std::env::consts::ARCH.to_string());
    report
        .environment
        .insert("platform".to_string(), options.platform.to_string());
    report
        .environment
        .insert("interpreter".to_string(), options.interpreter.clone());

    let verifier = ToolchainVerifier::new(runner, &options.platform);
    for req in requirements {
        report.add(check_requirement(&verifier, req));
    }

    report.add(check_ext_suffix(runner, options));
    report.add(check_ninja());

    report.total_duration = start.elapsed();
    report
}

fn check_requirement<R: CommandRunner>(
    verifier: &ToolchainVerifier<'_, R>,
    req: &ToolchainRequirement,
) -> CheckResult {
    let start = Instant::now();
    let path = find_executable(&req.program);

    let check = match verifier.verify(req) {
        Ok(version) => CheckResult::pass(
            req.name.as_str(),
            format!("{} {} (>= {})", req.name, version, req.minimum),
        )
        .with_version(version.to_string()),
        Err(err) => {
            let check = CheckResult::fail(req.name.as_str(), err.to_string());
            match err {
                PipelineError::ToolMissing { hint, .. } => check.with_hint(hint),
                PipelineError::ToolVersionTooOld { hint, found, .. } => {
                    check.with_hint(hint).with_version(found.to_string())
                }
                _ => check.with_hint(format!(
                    "Check that `{}` prints its version",
                    req.version_command().display_command()
                )),
            }
        }
    };

    check.with_path(path).with_duration(start.elapsed())
}

fn check_ext_suffix<R: CommandRunner>(runner: &R, options: &DoctorOptions) -> CheckResult {
    let start = Instant::now();
    let name = "extension suffix";

    let check = match probe_ext_suffix(runner, &options.interpreter) {
        Ok(suffix) => CheckResult::pass(name, format!("{} reports {}", options.interpreter, suffix))
            .with_version(suffix),
        Err(err) => CheckResult::fail(name, err.to_string())
            .with_hint("Pass --ext-suffix to `extforge build` explicitly"),
    };

    // Only macOS placeholder naming depends on the suffix.
    let check = if options.platform == HostPlatform::MacOs {
        check
    } else {
        check.optional()
    };
    check.with_duration(start.elapsed())
}

fn check_ninja() -> CheckResult {
    match find_executable("ninja") {
        Some(path) => CheckResult::pass("ninja", "found").with_path(Some(path)),
        None => CheckResult::fail("ninja", "not found")
            .with_hint("Only needed with `generator = \"Ninja\"`"),
    }
    .optional()
}

/// Format the doctor report for display.
pub fn format_report(report: &DoctorReport, verbose: bool) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "extforge doctor");
    let _ = writeln!(output, "===============\n");

    if verbose {
        let _ = writeln!(output, "Environment:");
        for (key, value) in &report.environment {
            let _ = writeln!(output, "  {}: {}", key, value);
        }
        let _ = writeln!(output);
    }

    let _ = writeln!(output, "Checks:");
    for check in &report.checks {
        let status = if check.passed { "[OK]" } else { "[!!]" };
        let required = if check.required { "" } else { " (optional)" };
        let version = check
            .version
            .as_deref()
            .map(|v| format!(" {}", v))
            .unwrap_or_default();

        let _ = writeln!(output, "  {} {}{}{}", status, check.name, version, required);

        if verbose {
            let _ = writeln!(output, "      {}", check.message);
            if let Some(path) = &check.path {
                let _ = writeln!(output, "      Path: {}", path.display());
            }
        }
        if !check.passed {
            if let Some(hint) = &check.hint {
                let _ = writeln!(output, "      help: {}", hint);
            }
        }
    }

    let _ = writeln!(output);

    let passed = report.passed_count();
    let failed = report.failed_count();
    let required_failed = report.required_failed_count();

    let _ = writeln!(output, "Summary: {} passed, {} failed", passed, failed);

    if required_failed > 0 {
        let _ = writeln!(
            output,
            "\n{} required check(s) failed. `extforge build` will not get past toolchain verification.",
            required_failed
        );
    } else if failed > 0 {
        let _ = writeln!(
            output,
            "\nAll required checks passed. {} optional check(s) failed.",
            failed
        );
    } else {
        let _ = writeln!(output, "\nAll checks passed.");
    }

    output
}
