//! `extforge build` command

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use super::{load_project_config, requirements};
use crate::cli::BuildArgs;
use extforge::builder::{PipelineEvent, Stage};
use extforge::core::{BuildConfiguration, BuildMode, HostPlatform, ToolchainRequirement};
use extforge::ops::run_pipeline;
use extforge::util::config::resolve_jobs;
use extforge::util::diagnostic::emit;
use extforge::util::shell::{format_duration, Spinner, Status};
use extforge::util::{Shell, SystemRunner};

pub fn execute(args: BuildArgs, shell: &Shell) -> Result<()> {
    let source_dir = absolute(&args.source_dir)?;
    let file_config = load_project_config(&source_dir)?;

    let (requirements, interpreter) = requirements(&file_config, args.python.as_deref())?;

    // Jobs: CLI > config > CMAKE_BUILD_PARALLEL_LEVEL > CPU count
    let jobs = resolve_jobs(
        args.jobs,
        file_config.build.jobs,
        std::env::var("CMAKE_BUILD_PARALLEL_LEVEL").ok().as_deref(),
    );

    let mut config = BuildConfiguration::new(
        source_dir,
        absolute(&args.build_temp)?,
        absolute(&args.install_dir)?,
    )
    .with_mode(BuildMode::from_debug_flag(args.debug || debug_from_env()))
    .with_jobs(jobs)
    .with_platform(args.platform.unwrap_or_else(HostPlatform::host))
    .with_layout(file_config.layout())
    .with_interpreter(interpreter);

    if let Some(suffix) = args.ext_suffix {
        if config.platform != HostPlatform::MacOs {
            shell.warn(format!(
                "--ext-suffix `{}` has no effect on {}",
                suffix, config.platform
            ));
        }
        config = config.with_ext_suffix(suffix);
    }
    if let Some(version) = args.package_version {
        config = config.with_package_version(version);
    }
    if let Some(generator) = args.generator.or(file_config.build.generator.clone()) {
        config = config.with_generator(generator);
    }
    // Config-file defines first so the command line can override them.
    let defines = file_config
        .build
        .defines
        .iter()
        .chain(args.defines.iter().map(|(k, v)| (k, v)));
    for (key, value) in defines {
        config = config.with_define(key, value);
    }

    let mut spinner: Option<Spinner> = None;
    let result = run_pipeline(&config, &requirements, &SystemRunner, &mut |event: &PipelineEvent| {
        observe(shell, &config, &requirements, &mut spinner, event)
    });
    drop(spinner);

    match result {
        Ok(report) => {
            shell.status(
                Status::Finished,
                format!(
                    "{} extension `{}` into {} in {}",
                    report.mode,
                    config.layout.module,
                    config.output_dir().display(),
                    format_duration(Duration::from_millis(report.duration_ms))
                ),
            );
            Ok(())
        }
        Err(failure) => {
            if !shell.is_json() {
                emit(&failure.to_diagnostic(), shell.use_color());
            }
            std::process::exit(1);
        }
    }
}

/// Translate pipeline events into shell output.
fn observe(
    shell: &Shell,
    config: &BuildConfiguration,
    requirements: &[ToolchainRequirement],
    spinner: &mut Option<Spinner>,
    event: &PipelineEvent,
) {
    if shell.is_json() {
        shell.json_event(event);
        return;
    }

    match event {
        PipelineEvent::StageStarted { stage } => {
            let (status, message) = describe(*stage, config, requirements);
            shell.status(status, &message);
            if *stage == Stage::Build {
                *spinner = Some(shell.spinner(message));
            }
        }
        PipelineEvent::StageFinished { stage, .. } => {
            if *stage == Stage::Build {
                if let Some(spinner) = spinner.take() {
                    spinner.finish();
                }
            }
        }
        PipelineEvent::ArtifactInstalled { artifact } => {
            let descriptor = &artifact.descriptor;
            shell.status(
                Status::Installed,
                format!("{} ({})", descriptor.filename, descriptor.kind),
            );
            shell.verbose(Status::Info, format!("sha256 {}", artifact.sha256));
        }
        PipelineEvent::PipelineFinished { .. } => {}
    }
}

fn describe(
    stage: Stage,
    config: &BuildConfiguration,
    requirements: &[ToolchainRequirement],
) -> (Status, String) {
    match stage {
        Stage::VerifyToolchain => {
            let names: Vec<_> = requirements.iter().map(|r| r.name.as_str()).collect();
            (Status::Verifying, format!("toolchain ({})", names.join(", ")))
        }
        Stage::Configure => (Status::Configuring, config.source_dir().display().to_string()),
        Stage::Build => (
            Status::Building,
            format!(
                "_{} ({}, {} jobs)",
                config.layout.module, config.mode, config.jobs
            ),
        ),
        Stage::LocateArtifacts => (
            Status::Locating,
            format!("artifacts in {}", config.build_tree().display()),
        ),
        Stage::AdaptPlatform => (Status::Adapting, format!("for {}", config.platform)),
        Stage::InstallBindings => (
            Status::Installing,
            format!("bindings into {}", config.output_dir().display()),
        ),
    }
}

/// `DEBUG=1` selects a debug build, as the packaging tool does.
fn debug_from_env() -> bool {
    std::env::var("DEBUG")
        .map(|v| !v.is_empty() && v != "0")
        .unwrap_or(false)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path)
        .with_context(|| format!("failed to resolve path: {}", path.display()))
}
