//! High-level operations.
//!
//! This module contains the implementation of extforge commands.

pub mod doctor;
pub mod extforge_build;

pub use doctor::{doctor, format_report, DoctorOptions, DoctorReport};
pub use extforge_build::{build, run_pipeline, InstallReport, PipelineResult};
