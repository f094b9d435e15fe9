//! Toolchain verification.
//!
//! Every [`ToolchainRequirement`] is checked in declaration order before the
//! build generator is touched. The first tool that is missing, unreadable or
//! too old aborts the run, so error messages are reproducible.

use std::io;

use serde::Serialize;

use crate::builder::error::PipelineError;
use crate::core::platform::HostPlatform;
use crate::core::requirement::ToolchainRequirement;
use crate::core::version::ToolVersion;
use crate::util::process::{CommandRunner, ProcessBuilder};

/// A requirement that passed verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifiedTool {
    pub name: String,
    pub version: ToolVersion,
}

/// Checks toolchain requirements by running each tool's version command.
pub struct ToolchainVerifier<'a, R: CommandRunner> {
    runner: &'a R,
    platform: &'a HostPlatform,
}

impl<'a, R: CommandRunner> ToolchainVerifier<'a, R> {
    pub fn new(runner: &'a R, platform: &'a HostPlatform) -> Self {
        ToolchainVerifier { runner, platform }
    }

    /// Verify all requirements, stopping at the first failure.
    pub fn verify_all(
        &self,
        requirements: &[ToolchainRequirement],
    ) -> Result<Vec<VerifiedTool>, PipelineError> {
        requirements
            .iter()
            .map(|req| {
                let version = self.verify(req)?;
                Ok(VerifiedTool {
                    name: req.name.clone(),
                    version,
                })
            })
            .collect()
    }

    /// Verify a single requirement and return the version found.
    pub fn verify(&self, req: &ToolchainRequirement) -> Result<ToolVersion, PipelineError> {
        let cmd = req.version_command();
        tracing::debug!("checking {}: `{}`", req.name, cmd.display_command());

        let output = self
            .runner
            .run(&cmd)
            .map_err(|source| self.missing(req, source))?;

        let text = output.text();
        let found = req
            .parser
            .parse(text)
            .map_err(|_| PipelineError::VersionUnparsable {
                tool: req.name.clone(),
                output: text.trim().to_string(),
            })?;

        if !found.meets(&req.minimum) {
            return Err(PipelineError::ToolVersionTooOld {
                tool: req.name.clone(),
                required: req.minimum.clone(),
                found,
                hint: format!(
                    "Upgrade {} to {} or newer: {}",
                    req.name,
                    req.minimum,
                    self.platform.install_hint(&req.hints)
                ),
            });
        }

        tracing::debug!("{} {} satisfies >= {}", req.name, found, req.minimum);
        Ok(found)
    }

    fn missing(&self, req: &ToolchainRequirement, source: io::Error) -> PipelineError {
        PipelineError::ToolMissing {
            tool: req.name.clone(),
            program: req.program.clone(),
            hint: format!(
                "Install {}: {}",
                req.name,
                self.platform.install_hint(&req.hints)
            ),
            source,
        }
    }
}

const EXT_SUFFIX_SCRIPT: &str =
    "import sysconfig; print(sysconfig.get_config_var('EXT_SUFFIX') or '')";

/// Ask the interpreter for its extension filename suffix.
///
/// Returns e.g. `.cpython-39-darwin.so`. Any failure, whether the
/// interpreter cannot be launched, exits non-zero or prints no suffix, is
/// reported as the interpreter missing.
pub fn probe_ext_suffix<R: CommandRunner>(
    runner: &R,
    interpreter: &str,
) -> Result<String, PipelineError> {
    let cmd = ProcessBuilder::new(interpreter).args(["-c", EXT_SUFFIX_SCRIPT]);
    tracing::debug!("probing extension suffix: `{}`", cmd.display_command());

    let missing = |source: io::Error| PipelineError::ToolMissing {
        tool: "python3".to_string(),
        program: interpreter.to_string(),
        hint: "Pass --ext-suffix explicitly or put a Python 3 interpreter on PATH".to_string(),
        source,
    };

    let output = runner.run(&cmd).map_err(missing)?;

    let suffix = output.stdout.trim();
    if !output.success() {
        return Err(missing(io::Error::other(format!(
            "EXT_SUFFIX query exited with {}: {}",
            output
                .code
                .map_or_else(|| "a signal".to_string(), |c| format!("code {}", c)),
            output.stderr.trim()
        ))));
    }
    if !suffix.starts_with('.') {
        return Err(missing(io::Error::other(format!(
            "EXT_SUFFIX query printed no suffix (got `{}`)",
            suffix
        ))));
    }

    Ok(suffix.to_string())
}
