//! extforge - build orchestrator for native Python extensions
//!
//! This crate checks the toolchain, drives CMake through its configure and
//! build phases, and installs the resulting extension module and its SWIG
//! binding shim under the names the host interpreter expects.

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

/// Test utilities and mocks for extforge unit tests.
///
/// This module is only available when compiling with `--cfg test`. It
/// provides a recording process runner and build-tree fixtures.
#[cfg(test)]
pub mod test_support;

pub use builder::{PipelineError, PipelineEvent, PipelineFailure, Stage};
pub use core::{BuildConfiguration, BuildMode, ExtensionLayout, HostPlatform, ToolchainRequirement};
pub use ops::{InstallReport, PipelineResult};
