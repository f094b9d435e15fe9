//! Command implementations

pub mod build;
pub mod completions;
pub mod doctor;

use std::path::Path;

use anyhow::Result;

use extforge::core::requirement::verified_interpreter;
use extforge::core::ToolchainRequirement;
use extforge::util::config::{global_config_path, load_config, project_config_path, Config};

/// Load the merged global + project configuration for `source_dir`.
pub(crate) fn load_project_config(source_dir: &Path) -> Result<Config> {
    let global = global_config_path();
    load_config(global.as_deref(), &project_config_path(source_dir))
}

/// Requirements to verify, and the interpreter the python3 check launches.
pub(crate) fn requirements(
    config: &Config,
    cli_interpreter: Option<&str>,
) -> Result<(Vec<ToolchainRequirement>, String)> {
    let requirements = config.requirements(cli_interpreter)?;
    let interpreter = verified_interpreter(&requirements)
        .map(str::to_string)
        .unwrap_or_else(|| config.interpreter(cli_interpreter));
    Ok((requirements, interpreter))
}
