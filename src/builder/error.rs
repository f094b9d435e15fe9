//! Pipeline stages and their failure taxonomy.

use std::fmt;
use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::core::artifact::ArtifactKind;
use crate::core::version::ToolVersion;
use crate::util::diagnostic::{suggestions, Diagnostic};

/// A step of the pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    VerifyToolchain,
    Configure,
    Build,
    LocateArtifacts,
    AdaptPlatform,
    InstallBindings,
}

impl Stage {
    /// All stages in the order they run.
    pub const ALL: [Stage; 6] = [
        Stage::VerifyToolchain,
        Stage::Configure,
        Stage::Build,
        Stage::LocateArtifacts,
        Stage::AdaptPlatform,
        Stage::InstallBindings,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::VerifyToolchain => "verify-toolchain",
            Stage::Configure => "configure",
            Stage::Build => "build",
            Stage::LocateArtifacts => "locate-artifacts",
            Stage::AdaptPlatform => "adapt-platform",
            Stage::InstallBindings => "install-bindings",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a pipeline stage failed. Every variant is terminal.
#[derive(Debug, Error, miette::Diagnostic)]
pub enum PipelineError {
    #[error("`{tool}` could not be launched")]
    #[diagnostic(code(extforge::toolchain::missing))]
    ToolMissing {
        tool: String,
        program: String,
        #[help]
        hint: String,
        #[source]
        source: io::Error,
    },

    #[error("could not read a version for `{tool}` from its output")]
    #[diagnostic(code(extforge::toolchain::unparsable))]
    VersionUnparsable { tool: String, output: String },

    #[error("`{tool}` {found} is too old; at least {required} is required")]
    #[diagnostic(code(extforge::toolchain::too_old))]
    ToolVersionTooOld {
        tool: String,
        required: ToolVersion,
        found: ToolVersion,
        #[help]
        hint: String,
    },

    #[error("configure step failed ({})", describe_exit(.code))]
    #[diagnostic(code(extforge::configure::failed))]
    ConfigurationFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("build step failed ({})", describe_exit(.code))]
    #[diagnostic(code(extforge::build::failed))]
    BuildFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{kind} not found at {}", .path.display())]
    #[diagnostic(code(extforge::artifact::not_found))]
    ArtifactNotFound { kind: ArtifactKind, path: PathBuf },

    #[error("unsupported platform `{os}`; only linux and macos are supported")]
    #[diagnostic(code(extforge::platform::unsupported))]
    UnsupportedPlatform { os: String },

    #[error("failed to {action} {}", .path.display())]
    #[diagnostic(code(extforge::fs::io))]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PipelineError {
    pub fn filesystem(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        PipelineError::Filesystem {
            action,
            path: path.into(),
            source,
        }
    }

    /// Short machine-readable kind, used in JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::ToolMissing { .. } => "tool-missing",
            PipelineError::VersionUnparsable { .. } => "version-unparsable",
            PipelineError::ToolVersionTooOld { .. } => "tool-version-too-old",
            PipelineError::ConfigurationFailed { .. } => "configuration-failed",
            PipelineError::BuildFailed { .. } => "build-failed",
            PipelineError::ArtifactNotFound { .. } => "artifact-not-found",
            PipelineError::UnsupportedPlatform { .. } => "unsupported-platform",
            PipelineError::Filesystem { .. } => "filesystem",
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal or not started".to_string(),
    }
}

/// Terminal failure of a pipeline run: which stage, and why.
#[derive(Debug, Error)]
#[error("{stage}: {error}")]
pub struct PipelineFailure {
    pub stage: Stage,
    #[source]
    pub error: PipelineError,
}

impl PipelineFailure {
    pub fn new(stage: Stage, error: PipelineError) -> Self {
        PipelineFailure { stage, error }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.error.to_string())
            .with_context(format!("stage: {}", self.stage));

        match &self.error {
            PipelineError::ToolMissing {
                program,
                hint,
                source,
                ..
            } => diag
                .with_context(format!("`{}`: {}", program, source))
                .with_suggestion(hint.clone())
                .with_suggestion(suggestions::RUN_DOCTOR),

            PipelineError::VersionUnparsable { output, .. } => diag
                .with_context(format!("output was: {}", output.trim()))
                .with_suggestion(suggestions::RUN_DOCTOR),

            PipelineError::ToolVersionTooOld { hint, .. } => diag
                .with_suggestion(hint.clone())
                .with_suggestion(suggestions::RUN_DOCTOR),

            PipelineError::ConfigurationFailed {
                command, stderr, ..
            }
            | PipelineError::BuildFailed {
                command, stderr, ..
            } => {
                let diag = diag.with_context(format!("command: {}", command));
                let diag = if stderr.trim().is_empty() {
                    diag
                } else {
                    diag.with_context(stderr.trim_end().to_string())
                };
                diag.with_suggestion(suggestions::RERUN_VERBOSE)
            }

            PipelineError::ArtifactNotFound { path, .. } => diag
                .with_location(path.clone())
                .with_suggestion(suggestions::CLEAN_BUILD_TREE),

            PipelineError::UnsupportedPlatform { .. } => diag
                .with_suggestion("Build the extension on Linux or macOS"),

            PipelineError::Filesystem { source, .. } => diag.with_context(source.to_string()),
        }
    }
}
