//! Test fixtures for common pipeline scenarios.
//!
//! [`BuildTreeFixture`] lays out a throwaway source dir, build tree and
//! install dir, and can drop fake generator outputs into the build tree the
//! way a successful CMake + SWIG run would.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::{MockProcessOutput, MockRunner};
use crate::core::configuration::BuildConfiguration;
use crate::core::platform::HostPlatform;

/// Contents written as the fake compiled binary.
pub const FAKE_BINARY: &[u8] = b"\x7fELF\x02\x01\x01\0fake _pyjass module";

/// Contents written as the fake binding shim.
pub const FAKE_SHIM: &str = "# This file was automatically generated by SWIG.\nfrom . import _pyjass\n";

/// Canned tool output banners.
pub mod tool_outputs {
    use super::MockProcessOutput;

    pub fn cmake_version(version: &str) -> MockProcessOutput {
        MockProcessOutput::success(format!(
            "cmake version {version}\n\nCMake suite maintained and supported by Kitware (kitware.com/cmake).\n"
        ))
    }

    pub fn swig_version(version: &str) -> MockProcessOutput {
        MockProcessOutput::success(format!(
            "\nSWIG Version {version}\n\nCompiled with g++ [x86_64-pc-linux-gnu]\n\nConfigured options: +pcre\n"
        ))
    }

    pub fn python_version(version: &str) -> MockProcessOutput {
        MockProcessOutput::success(format!("Python {version}\n"))
    }

    pub fn configure_ok() -> MockProcessOutput {
        MockProcessOutput::success(
            "-- The CXX compiler identification is GNU 11.4.0\n-- Configuring done\n-- Generating done\n",
        )
    }

    pub fn build_ok() -> MockProcessOutput {
        MockProcessOutput::success("[100%] Built target _pyjass\n")
    }
}

/// Answer every toolchain version query with a satisfying version.
pub fn expect_toolchain(runner: &MockRunner) {
    runner.expect_prefix("cmake --version", tool_outputs::cmake_version("3.22.1"));
    runner.expect_prefix("swig -version", tool_outputs::swig_version("4.0.2"));
    runner.expect_prefix("python3 --version", tool_outputs::python_version("3.9.7"));
}

/// Answer configure and build invocations with success.
pub fn expect_cmake_success(runner: &MockRunner) {
    runner.expect_prefix("cmake --build", tool_outputs::build_ok());
    runner.expect_prefix("cmake -S", tool_outputs::configure_ok());
}

/// Source dir, build tree and install dir under one temporary root.
pub struct BuildTreeFixture {
    root: TempDir,
}

impl BuildTreeFixture {
    pub fn new() -> Self {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("src")).unwrap();
        fs::write(
            root.path().join("src").join("CMakeLists.txt"),
            "cmake_minimum_required(VERSION 3.12)\nproject(pyjass CXX)\n",
        )
        .unwrap();
        BuildTreeFixture { root }
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn source_dir(&self) -> PathBuf {
        self.root().join("src")
    }

    pub fn build_tree(&self) -> PathBuf {
        self.root().join("build")
    }

    pub fn install_dir(&self) -> PathBuf {
        self.root().join("out")
    }

    /// Write the generator outputs a successful build leaves behind.
    pub fn with_outputs(self) -> Self {
        self.write_build_file("_pyjass.so", FAKE_BINARY);
        self.write_build_file("pyjass.py", FAKE_SHIM.as_bytes());
        self
    }

    pub fn write_build_file(&self, name: &str, contents: &[u8]) -> PathBuf {
        self.write_into(&self.build_tree(), name, contents)
    }

    pub fn write_install_file(&self, name: &str, contents: &[u8]) -> PathBuf {
        self.write_into(&self.install_dir(), name, contents)
    }

    fn write_into(&self, dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
        fs::create_dir_all(dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    /// Sorted file names in the install directory.
    pub fn installed_names(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.install_dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Configuration pointing at this fixture's directories.
    pub fn config(&self, platform: HostPlatform) -> BuildConfiguration {
        BuildConfiguration::new(self.source_dir(), self.build_tree(), self.install_dir())
            .with_platform(platform)
            .with_jobs(4)
    }
}

impl Default for BuildTreeFixture {
    fn default() -> Self {
        BuildTreeFixture::new()
    }
}
