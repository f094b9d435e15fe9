//! Configuration file support for extforge.
//!
//! extforge reads two configuration files:
//! - Global: `~/.extforge/config.toml` - User-wide defaults
//! - Project: `<source dir>/extforge.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config; command-line flags
//! take precedence over both.
//!
//! ```toml
//! [extension]
//! module = "pyjass"
//! placeholder_stem = "dummy"
//!
//! [build]
//! jobs = 8
//! generator = "Ninja"
//! interpreter = "python3.11"
//!
//! [build.defines]
//! SWIG_EXECUTABLE = "/opt/swig/bin/swig"
//!
//! [toolchain.cmake]
//! min_version = "3.18"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::configuration::{default_jobs, default_stale_patterns, ExtensionLayout};
use crate::core::requirement::{self, ToolchainRequirement};
use crate::core::version::ToolVersion;
use crate::util::fs::read_to_string;

/// Name of the project configuration file.
pub const PROJECT_CONFIG_FILE: &str = "extforge.toml";

/// extforge configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Names of the extension's files
    pub extension: ExtensionConfig,

    /// Build settings
    pub build: BuildConfig,

    /// Per-tool overrides, keyed by requirement name
    pub toolchain: BTreeMap<String, ToolOverride>,
}

/// Extension layout overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionConfig {
    /// Python module name (default "pyjass")
    pub module: Option<String>,

    /// Shim path relative to the build tree (default "<module>.py")
    pub shim: Option<PathBuf>,

    /// Placeholder stem registered with the packaging tool (default "dummy")
    pub placeholder_stem: Option<String>,

    /// Globs of stale placeholders to delete from the install dir
    pub stale_patterns: Option<Vec<String>>,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Default number of parallel jobs (None = auto-detect)
    pub jobs: Option<usize>,

    /// CMake generator passed as `-G`
    pub generator: Option<String>,

    /// Extra `-D` definitions for the configure phase
    pub defines: BTreeMap<String, String>,

    /// Interpreter the extension is built for
    pub interpreter: Option<String>,
}

/// Override for one toolchain requirement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolOverride {
    /// Oldest accepted version
    pub min_version: Option<ToolVersion>,

    /// Program to launch instead of the tool's name
    pub program: Option<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = read_to_string(path)?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration, or defaults if the file does not exist.
    ///
    /// A file that exists but cannot be read or parsed is an error.
    pub fn load_if_exists(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        // Extension settings
        if other.extension.module.is_some() {
            self.extension.module = other.extension.module;
        }
        if other.extension.shim.is_some() {
            self.extension.shim = other.extension.shim;
        }
        if other.extension.placeholder_stem.is_some() {
            self.extension.placeholder_stem = other.extension.placeholder_stem;
        }
        if other.extension.stale_patterns.is_some() {
            self.extension.stale_patterns = other.extension.stale_patterns;
        }

        // Build settings
        if other.build.jobs.is_some() {
            self.build.jobs = other.build.jobs;
        }
        if other.build.generator.is_some() {
            self.build.generator = other.build.generator;
        }
        if other.build.interpreter.is_some() {
            self.build.interpreter = other.build.interpreter;
        }
        self.build.defines.extend(other.build.defines);

        // Toolchain overrides merge per field
        for (tool, over) in other.toolchain {
            let entry = self.toolchain.entry(tool).or_default();
            if over.min_version.is_some() {
                entry.min_version = over.min_version;
            }
            if over.program.is_some() {
                entry.program = over.program;
            }
        }
    }

    /// The extension layout, with defaults for anything not configured.
    pub fn layout(&self) -> ExtensionLayout {
        let ext = &self.extension;
        let mut layout = ExtensionLayout::new(ext.module.as_deref().unwrap_or("pyjass"));

        if let Some(shim) = &ext.shim {
            layout.shim = shim.clone();
        }
        if let Some(stem) = &ext.placeholder_stem {
            layout.placeholder_stem = stem.clone();
            layout.stale_patterns = default_stale_patterns(&layout.module, stem);
        }
        if let Some(patterns) = &ext.stale_patterns {
            layout.stale_patterns = patterns.clone();
        }

        layout
    }

    /// The interpreter the extension is built for.
    ///
    /// Order of precedence: command line, `[toolchain.python3] program`,
    /// `build.interpreter`, then `python3`.
    pub fn interpreter(&self, cli: Option<&str>) -> String {
        let over = self
            .toolchain
            .get(requirement::PYTHON)
            .and_then(|o| o.program.as_deref());

        cli.or(over)
            .or(self.build.interpreter.as_deref())
            .unwrap_or(requirement::PYTHON)
            .to_string()
    }

    /// Default requirements with `[toolchain.<tool>]` overrides applied.
    ///
    /// The python3 requirement always launches [`Config::interpreter`], so
    /// the program that is verified is the one the build uses.
    pub fn requirements(&self, cli_interpreter: Option<&str>) -> Result<Vec<ToolchainRequirement>> {
        let interpreter = self.interpreter(cli_interpreter);
        let mut requirements = requirement::default_requirements(&interpreter)?;
        self.apply_toolchain(&mut requirements);

        if let Some(python) = requirements.iter_mut().find(|r| r.name == requirement::PYTHON) {
            python.program = interpreter;
        }
        Ok(requirements)
    }

    /// Apply `[toolchain.<tool>]` overrides to the requirement list.
    pub fn apply_toolchain(&self, requirements: &mut [ToolchainRequirement]) {
        for (tool, over) in &self.toolchain {
            let Some(req) = requirements.iter_mut().find(|r| &r.name == tool) else {
                tracing::warn!("ignoring override for unknown tool `{}`", tool);
                continue;
            };
            if let Some(min) = &over.min_version {
                tracing::debug!("{} minimum version overridden to {}", tool, min);
                req.minimum = min.clone();
            }
            if let Some(program) = &over.program {
                req.program = program.clone();
            }
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (<source dir>/extforge.toml)
/// 2. Global config (~/.extforge/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Result<Config> {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_if_exists(global_path)?);
    }
    config.merge(Config::load_if_exists(project_path)?);

    Ok(config)
}

/// Get the global extforge config directory (~/.extforge).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".extforge"))
}

/// Get the global config path (~/.extforge/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (<source dir>/extforge.toml).
pub fn project_config_path(source_dir: &Path) -> PathBuf {
    source_dir.join(PROJECT_CONFIG_FILE)
}

/// Resolve the parallelism hint.
///
/// Order of precedence: command line, config file, `CMAKE_BUILD_PARALLEL_LEVEL`,
/// then the number of available CPUs.
pub fn resolve_jobs(cli: Option<usize>, config: Option<usize>, env: Option<&str>) -> usize {
    cli.or(config)
        .or_else(|| env.and_then(|v| v.trim().parse().ok()))
        .filter(|&n| n > 0)
        .unwrap_or_else(default_jobs)
}
