//! Toolchain requirements.
//!
//! A requirement names an external tool, how to ask it for its version, the
//! oldest version the build accepts, and how to install it.

use std::sync::Arc;

use anyhow::Result;

use crate::core::platform::InstallHints;
use crate::core::version::{RegexVersionParser, ToolVersion, VersionParser};
use crate::util::process::ProcessBuilder;

/// A tool the pipeline needs before it may invoke the build generator.
#[derive(Debug, Clone)]
pub struct ToolchainRequirement {
    /// Display name (e.g., "cmake")
    pub name: String,

    /// Program to launch
    pub program: String,

    /// Arguments that make the program print its version
    pub version_args: Vec<String>,

    /// Oldest accepted version
    pub minimum: ToolVersion,

    /// Extracts the version from the program's output
    pub parser: Arc<dyn VersionParser + Send + Sync>,

    /// How to install the tool on each platform
    pub hints: InstallHints,
}

impl ToolchainRequirement {
    /// Create a requirement whose version is extracted with `pattern`.
    pub fn new(
        name: impl Into<String>,
        version_args: &[&str],
        minimum: ToolVersion,
        pattern: &str,
        hints: InstallHints,
    ) -> Result<Self> {
        let name = name.into();
        Ok(ToolchainRequirement {
            program: name.clone(),
            name,
            version_args: version_args.iter().map(|s| s.to_string()).collect(),
            minimum,
            parser: Arc::new(RegexVersionParser::new(pattern)?),
            hints,
        })
    }

    /// Launch a different program than the requirement's name.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Replace the minimum version.
    pub fn with_minimum(mut self, minimum: ToolVersion) -> Self {
        self.minimum = minimum;
        self
    }

    /// The command that prints this tool's version.
    pub fn version_command(&self) -> ProcessBuilder {
        ProcessBuilder::new(&self.program).args(&self.version_args)
    }
}

/// The build generator.
pub fn cmake() -> Result<ToolchainRequirement> {
    ToolchainRequirement::new(
        "cmake",
        &["--version"],
        ToolVersion::new(3, 12),
        r"cmake version (\d+)\.(\d+)",
        InstallHints::new(
            "apt install cmake (or dnf install cmake)",
            "brew install cmake",
            "download CMake from https://cmake.org/download/",
        ),
    )
}

/// The interface generator that emits the binding shim.
pub fn swig() -> Result<ToolchainRequirement> {
    ToolchainRequirement::new(
        "swig",
        &["-version"],
        ToolVersion::new(3, 0),
        r"SWIG Version (\d+)\.(\d+)",
        InstallHints::new(
            "apt install swig (or dnf install swig)",
            "brew install swig",
            "download SWIG from https://www.swig.org/download.html",
        ),
    )
}

/// The host interpreter the extension is built for.
pub fn python(program: &str) -> Result<ToolchainRequirement> {
    Ok(ToolchainRequirement::new(
        PYTHON,
        &["--version"],
        ToolVersion::new(3, 6),
        r"Python (\d+)\.(\d+)",
        InstallHints::new(
            "apt install python3 python3-dev (or dnf install python3-devel)",
            "brew install python",
            "download Python from https://www.python.org/downloads/",
        ),
    )?
    .with_program(program))
}

/// Name of the interpreter requirement.
pub const PYTHON: &str = "python3";

/// Requirements checked on every run, in the order they are checked.
pub fn default_requirements(interpreter: &str) -> Result<Vec<ToolchainRequirement>> {
    Ok(vec![cmake()?, swig()?, python(interpreter)?])
}

/// The interpreter program the requirements verify, if any.
///
/// The build hands this same program to CMake and asks it for EXT_SUFFIX.
pub fn verified_interpreter(requirements: &[ToolchainRequirement]) -> Option<&str> {
    requirements
        .iter()
        .find(|r| r.name == PYTHON)
        .map(|r| r.program.as_str())
}
