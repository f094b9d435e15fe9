//! CMake invocation: configure, then build.

use crate::builder::error::PipelineError;
use crate::core::configuration::BuildConfiguration;
use crate::util::fs::ensure_dir;
use crate::util::process::{CommandRunner, ProcessBuilder, ProcessOutput};

/// Runs the build generator in two phases against a [`BuildConfiguration`].
pub struct BuildInvoker<'a, R: CommandRunner> {
    runner: &'a R,
    config: &'a BuildConfiguration,
    cmake: String,
}

impl<'a, R: CommandRunner> BuildInvoker<'a, R> {
    pub fn new(runner: &'a R, config: &'a BuildConfiguration) -> Self {
        BuildInvoker {
            runner,
            config,
            cmake: "cmake".to_string(),
        }
    }

    /// Use a specific CMake executable instead of the one on PATH.
    pub fn with_cmake(mut self, cmake: impl Into<String>) -> Self {
        self.cmake = cmake.into();
        self
    }

    /// Command line for the configure phase.
    pub fn configure_command(&self) -> ProcessBuilder {
        let config = self.config;

        let mut cmd = ProcessBuilder::new(&self.cmake)
            .arg("-S")
            .arg(config.source_dir())
            .arg("-B")
            .arg(config.build_tree())
            .arg(format!("-DCMAKE_BUILD_TYPE={}", config.mode.cmake_name()))
            .arg(format!(
                "-DCMAKE_INSTALL_PREFIX={}",
                config.output_dir().display()
            ))
            .arg(format!("-DPYTHON_EXECUTABLE={}", config.interpreter));

        if let Some(generator) = &config.generator {
            cmd = cmd.arg("-G").arg(generator);
        }

        for (key, value) in &config.defines {
            cmd = cmd.arg(format!("-D{}={}", key, value));
        }

        if let Some(version) = &config.package_version {
            cmd = cmd.env("CXXFLAGS", cxxflags_with_version(version));
        }

        cmd
    }

    /// Command line for the build phase.
    pub fn build_command(&self) -> ProcessBuilder {
        ProcessBuilder::new(&self.cmake)
            .arg("--build")
            .arg(self.config.build_tree())
            .arg("--config")
            .arg(self.config.mode.cmake_name())
            .arg("--parallel")
            .arg(self.config.jobs.to_string())
    }

    /// Create the build tree and run the configure phase.
    pub fn configure(&self) -> Result<ProcessOutput, PipelineError> {
        let tree = self.config.build_tree();
        ensure_dir(tree)
            .map_err(|e| PipelineError::filesystem("create build tree", tree, e))?;

        let cmd = self.configure_command();
        match self.runner.run(&cmd) {
            Ok(output) if output.success() => Ok(output),
            Ok(output) => Err(PipelineError::ConfigurationFailed {
                command: cmd.display_command(),
                code: output.code,
                stderr: output.stderr,
            }),
            Err(e) => Err(PipelineError::ConfigurationFailed {
                command: cmd.display_command(),
                code: None,
                stderr: e.to_string(),
            }),
        }
    }

    /// Run the build phase.
    pub fn build(&self) -> Result<ProcessOutput, PipelineError> {
        let cmd = self.build_command();
        match self.runner.run(&cmd) {
            Ok(output) if output.success() => Ok(output),
            Ok(output) => Err(PipelineError::BuildFailed {
                command: cmd.display_command(),
                code: output.code,
                stderr: output.stderr,
            }),
            Err(e) => Err(PipelineError::BuildFailed {
                command: cmd.display_command(),
                code: None,
                stderr: e.to_string(),
            }),
        }
    }
}

/// The child's `CXXFLAGS` with the package version macro appended.
fn cxxflags_with_version(version: &str) -> String {
    let define = format!("-DVERSION_INFO=\\\"{}\\\"", version);
    match std::env::var("CXXFLAGS") {
        Ok(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim(), define),
        _ => define,
    }
}
