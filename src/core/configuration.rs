//! Per-run build configuration.
//!
//! A [`BuildConfiguration`] is assembled once from CLI arguments, environment
//! and config files, then handed by reference to every pipeline stage. Nothing
//! in the pipeline reads process-wide state on its own.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::platform::HostPlatform;

/// Optimised or debug build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    #[default]
    Release,
    Debug,
}

impl BuildMode {
    pub fn from_debug_flag(debug: bool) -> Self {
        if debug {
            BuildMode::Debug
        } else {
            BuildMode::Release
        }
    }

    /// Configuration name understood by CMake.
    pub fn cmake_name(self) -> &'static str {
        match self {
            BuildMode::Release => "Release",
            BuildMode::Debug => "Debug",
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildMode::Release => write!(f, "release"),
            BuildMode::Debug => write!(f, "debug"),
        }
    }
}

/// Names of the files that make up the extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionLayout {
    /// Python module name; the compiled binary is `_<module>` + suffix
    pub module: String,

    /// Shim location relative to the build tree
    pub shim: PathBuf,

    /// Stem of the placeholder extension the packaging tool registered
    pub placeholder_stem: String,

    /// Glob patterns (relative to the install dir) of stale placeholders
    pub stale_patterns: Vec<String>,
}

impl ExtensionLayout {
    /// Layout with the default shim name, placeholder stem and stale patterns.
    pub fn new(module: impl Into<String>) -> Self {
        let module = module.into();
        let placeholder_stem = "dummy".to_string();
        ExtensionLayout {
            shim: PathBuf::from(format!("{}.py", module)),
            stale_patterns: default_stale_patterns(&module, &placeholder_stem),
            module,
            placeholder_stem,
        }
    }

    /// Filename of the compiled binary for a platform.
    pub fn binary_name(&self, platform: &HostPlatform) -> String {
        format!("_{}{}", self.module, platform.module_suffix())
    }

    /// Filename of the placeholder the packaging tool expects.
    pub fn placeholder_name(&self, ext_suffix: &str) -> String {
        format!("{}{}", self.placeholder_stem, ext_suffix)
    }

    /// Filename of the shim once installed.
    pub fn shim_name(&self) -> String {
        self.shim
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}.py", self.module))
    }
}

impl Default for ExtensionLayout {
    fn default() -> Self {
        ExtensionLayout::new("pyjass")
    }
}

/// Placeholder globs left behind by the packaging tool's extension discovery.
pub fn default_stale_patterns(module: &str, placeholder_stem: &str) -> Vec<String> {
    let mut patterns = vec![format!("{}.cpython*", module)];
    if placeholder_stem != module {
        patterns.push(format!("{}.cpython*", placeholder_stem));
    }
    patterns
}

/// Everything a single pipeline run needs to know.
#[derive(Debug, Clone, Serialize)]
pub struct BuildConfiguration {
    /// Directory containing the top-level CMakeLists.txt
    pub source_dir: PathBuf,

    /// Temporary directory the generator builds into
    pub build_tree: PathBuf,

    /// Final install directory for the extension
    pub output_dir: PathBuf,

    pub mode: BuildMode,

    /// Worker count handed to the build generator
    pub jobs: usize,

    pub platform: HostPlatform,

    pub layout: ExtensionLayout,

    /// Interpreter extension suffix (e.g., `.cpython-39-darwin.so`);
    /// probed from the interpreter when absent
    pub ext_suffix: Option<String>,

    /// Interpreter used for probing and passed to CMake
    pub interpreter: String,

    /// Package version exported to the compiler as `VERSION_INFO`
    pub package_version: Option<String>,

    /// CMake generator (`-G`)
    pub generator: Option<String>,

    /// Extra `-D` definitions for the configure phase
    pub defines: Vec<(String, String)>,
}

impl BuildConfiguration {
    /// Configuration with defaults for everything but the three directories.
    pub fn new(
        source_dir: impl Into<PathBuf>,
        build_tree: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        BuildConfiguration {
            source_dir: source_dir.into(),
            build_tree: build_tree.into(),
            output_dir: output_dir.into(),
            mode: BuildMode::Release,
            jobs: default_jobs(),
            platform: HostPlatform::host(),
            layout: ExtensionLayout::default(),
            ext_suffix: None,
            interpreter: "python3".to_string(),
            package_version: None,
            generator: None,
            defines: Vec::new(),
        }
    }

    pub fn with_mode(mut self, mode: BuildMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn with_platform(mut self, platform: HostPlatform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_layout(mut self, layout: ExtensionLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_ext_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.ext_suffix = Some(suffix.into());
        self
    }

    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    pub fn with_package_version(mut self, version: impl Into<String>) -> Self {
        self.package_version = Some(version.into());
        self
    }

    pub fn with_generator(mut self, generator: impl Into<String>) -> Self {
        self.generator = Some(generator.into());
        self
    }

    pub fn with_define(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.defines.push((key.into(), value.into()));
        self
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn build_tree(&self) -> &Path {
        &self.build_tree
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

/// Worker count when nothing else is configured.
pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
