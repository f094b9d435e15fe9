//! Implementation of `extforge build`.
//!
//! Runs the stages in order:
//! `VerifyToolchain → Configure → Build → LocateArtifacts → AdaptPlatform →
//! InstallBindings`. The first failing stage ends the run; there are no
//! retries.

use std::time::Instant;

use serde::Serialize;

use crate::builder::error::{PipelineError, PipelineFailure, Stage};
use crate::builder::events::PipelineEvent;
use crate::builder::{
    probe_ext_suffix, ArtifactLocator, BindingInstaller, BuildInvoker, PlatformAdapter,
    ToolchainVerifier, VerifiedTool,
};
use crate::core::artifact::{ArtifactKind, InstalledArtifact};
use crate::core::configuration::{BuildConfiguration, BuildMode};
use crate::core::platform::HostPlatform;
use crate::core::requirement::ToolchainRequirement;
use crate::util::process::CommandRunner;

/// What a successful run installed.
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub platform: HostPlatform,
    pub mode: BuildMode,
    pub tools: Vec<VerifiedTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext_suffix: Option<String>,
    pub artifacts: Vec<InstalledArtifact>,
    pub duration_ms: u64,
}

impl InstallReport {
    /// Installed artifacts of one kind.
    pub fn artifacts_of(&self, kind: ArtifactKind) -> impl Iterator<Item = &InstalledArtifact> {
        self.artifacts
            .iter()
            .filter(move |a| a.descriptor.kind == kind)
    }
}

pub type PipelineResult = Result<InstallReport, PipelineFailure>;

/// Run the pipeline without observing events.
pub fn build<R: CommandRunner>(
    config: &BuildConfiguration,
    requirements: &[ToolchainRequirement],
    runner: &R,
) -> PipelineResult {
    run_pipeline(config, requirements, runner, &mut |_: &PipelineEvent| {})
}

/// Run the pipeline, reporting progress through `on_event`.
pub fn run_pipeline<R: CommandRunner>(
    config: &BuildConfiguration,
    requirements: &[ToolchainRequirement],
    runner: &R,
    on_event: &mut dyn FnMut(&PipelineEvent),
) -> PipelineResult {
    let start = Instant::now();
    let mut events = Events { on_event };

    tracing::info!(
        "building `{}` for {} ({}, {} jobs)",
        config.layout.module,
        config.platform,
        config.mode,
        config.jobs
    );

    let result = run_stages(config, requirements, runner, &mut events, start);

    let duration_ms = elapsed_ms(start);
    match &result {
        Ok(report) => events.emit(&PipelineEvent::finished_ok(
            duration_ms,
            report.artifacts.clone(),
        )),
        Err(failure) => events.emit(&PipelineEvent::finished_err(duration_ms, failure)),
    }
    result
}

fn run_stages<R: CommandRunner>(
    config: &BuildConfiguration,
    requirements: &[ToolchainRequirement],
    runner: &R,
    events: &mut Events<'_>,
    start: Instant,
) -> PipelineResult {
    let (tools, ext_suffix) = events.stage(Stage::VerifyToolchain, || {
        let tools = ToolchainVerifier::new(runner, &config.platform).verify_all(requirements)?;
        let ext_suffix = match (&config.ext_suffix, &config.platform) {
            (Some(suffix), _) => Some(suffix.clone()),
            (None, HostPlatform::MacOs) => Some(probe_ext_suffix(runner, &config.interpreter)?),
            (None, _) => None,
        };
        Ok((tools, ext_suffix))
    })?;

    let invoker = BuildInvoker::new(runner, config).with_cmake(cmake_program(requirements));
    events.stage(Stage::Configure, || invoker.configure())?;
    events.stage(Stage::Build, || invoker.build())?;

    let located = events.stage(Stage::LocateArtifacts, || {
        ArtifactLocator::new(config).locate()
    })?;

    let placed = events.stage(Stage::AdaptPlatform, || {
        PlatformAdapter::new(config, ext_suffix.as_deref()).adapt(&located)
    })?;

    let artifacts = events.stage(Stage::InstallBindings, || {
        BindingInstaller::new(config).install(&located, placed)
    })?;

    for artifact in &artifacts {
        tracing::debug!(
            "installed {} ({})",
            artifact.descriptor.destination.display(),
            artifact.sha256
        );
        events.emit(&PipelineEvent::ArtifactInstalled {
            artifact: artifact.clone(),
        });
    }

    Ok(InstallReport {
        platform: config.platform.clone(),
        mode: config.mode,
        tools,
        ext_suffix,
        artifacts,
        duration_ms: elapsed_ms(start),
    })
}

/// The CMake executable named by the requirements, if overridden.
fn cmake_program(requirements: &[ToolchainRequirement]) -> String {
    requirements
        .iter()
        .find(|r| r.name == "cmake")
        .map(|r| r.program.clone())
        .unwrap_or_else(|| "cmake".to_string())
}

struct Events<'e> {
    on_event: &'e mut dyn FnMut(&PipelineEvent),
}

impl Events<'_> {
    fn emit(&mut self, event: &PipelineEvent) {
        (self.on_event)(event);
    }

    /// Run one stage, bracketed by start/finish events.
    fn stage<T>(
        &mut self,
        stage: Stage,
        f: impl FnOnce() -> Result<T, PipelineError>,
    ) -> Result<T, PipelineFailure> {
        tracing::info!("stage {}", stage);
        self.emit(&PipelineEvent::StageStarted { stage });

        let start = Instant::now();
        let result = f();

        self.emit(&PipelineEvent::StageFinished {
            stage,
            success: result.is_ok(),
            duration_ms: elapsed_ms(start),
        });

        result.map_err(|error| {
            tracing::debug!("stage {} failed: {}", stage, error);
            PipelineFailure::new(stage, error)
        })
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::Path;

    use super::*;
    use crate::core::requirement::{default_requirements, verified_interpreter};
    use crate::test_support::{
        expect_cmake_success, expect_toolchain, tool_outputs, BuildTreeFixture,
        MockProcessOutput, MockRunner, FAKE_BINARY,
    };
    use crate::util::config::{Config, ToolOverride};

    fn requirements() -> Vec<ToolchainRequirement> {
        default_requirements("python3").unwrap()
    }

    fn snapshot(dir: &Path) -> BTreeMap<String, Vec<u8>> {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| {
                (
                    e.file_name().to_string_lossy().into_owned(),
                    fs::read(e.path()).unwrap(),
                )
            })
            .collect()
    }

    #[test]
    fn test_old_tool_never_reaches_cmake() {
        let fixture = BuildTreeFixture::new().with_outputs();
        let runner = MockRunner::new();
        runner.expect_prefix("cmake --version", tool_outputs::cmake_version("3.22.1"));
        runner.expect_prefix("swig -version", tool_outputs::swig_version("2.0.12"));
        runner.expect_prefix("python3 --version", tool_outputs::python_version("3.9.7"));
        expect_cmake_success(&runner);

        let failure = build(&fixture.config(HostPlatform::Linux), &requirements(), &runner)
            .unwrap_err();

        assert_eq!(failure.stage, Stage::VerifyToolchain);
        assert!(matches!(
            failure.error,
            PipelineError::ToolVersionTooOld { ref tool, .. } if tool == "swig"
        ));
        assert_eq!(runner.count_prefix("cmake -S"), 0);
        assert_eq!(runner.count_prefix("cmake --build"), 0);
        assert!(!fixture.install_dir().exists());
    }

    #[test]
    fn test_minimum_versions_reach_configure() {
        let fixture = BuildTreeFixture::new();
        let runner = MockRunner::new();
        runner.expect_prefix("cmake --version", tool_outputs::cmake_version("3.12.0"));
        runner.expect_prefix("swig -version", tool_outputs::swig_version("3.0.0"));
        runner.expect_prefix("python3 --version", tool_outputs::python_version("3.6.0"));
        runner.expect_prefix("cmake -S", MockProcessOutput::failure(1, "CMake Error"));

        let failure = build(&fixture.config(HostPlatform::Linux), &requirements(), &runner)
            .unwrap_err();

        assert_eq!(failure.stage, Stage::Configure);
        assert_eq!(runner.count_prefix("cmake -S"), 1);
    }

    #[test]
    fn test_configure_failure_skips_build() {
        let fixture = BuildTreeFixture::new().with_outputs();
        let runner = MockRunner::new();
        expect_toolchain(&runner);
        runner.expect_prefix(
            "cmake -S",
            MockProcessOutput::failure(1, "CMake Error at CMakeLists.txt:12"),
        );
        runner.expect_prefix("cmake --build", tool_outputs::build_ok());

        let failure = build(&fixture.config(HostPlatform::Linux), &requirements(), &runner)
            .unwrap_err();

        assert_eq!(failure.stage, Stage::Configure);
        assert!(matches!(
            failure.error,
            PipelineError::ConfigurationFailed { code: Some(1), .. }
        ));
        assert_eq!(runner.count_prefix("cmake --build"), 0);
    }

    #[test]
    fn test_build_failure_stops_before_locate() {
        let fixture = BuildTreeFixture::new().with_outputs();
        let runner = MockRunner::new();
        expect_toolchain(&runner);
        runner.expect_prefix("cmake --build", MockProcessOutput::failure(2, "Error 2"));
        runner.expect_prefix("cmake -S", tool_outputs::configure_ok());

        let failure = build(&fixture.config(HostPlatform::Linux), &requirements(), &runner)
            .unwrap_err();

        assert_eq!(failure.stage, Stage::Build);
        assert!(!fixture.install_dir().exists());
    }

    #[test]
    fn test_missing_binary_after_build() {
        let fixture = BuildTreeFixture::new();
        let runner = MockRunner::new();
        expect_toolchain(&runner);
        expect_cmake_success(&runner);

        let failure = build(&fixture.config(HostPlatform::Linux), &requirements(), &runner)
            .unwrap_err();

        assert_eq!(failure.stage, Stage::LocateArtifacts);
        assert!(matches!(
            failure.error,
            PipelineError::ArtifactNotFound {
                kind: ArtifactKind::CompiledBinary,
                ..
            }
        ));
    }

    #[test]
    fn test_end_to_end_installs_one_binary_and_one_shim() {
        let fixture = BuildTreeFixture::new().with_outputs();
        let runner = MockRunner::new();
        expect_toolchain(&runner);
        expect_cmake_success(&runner);

        let report = build(&fixture.config(HostPlatform::Linux), &requirements(), &runner)
            .unwrap();

        let binaries: Vec<_> = report.artifacts_of(ArtifactKind::CompiledBinary).collect();
        let shims: Vec<_> = report.artifacts_of(ArtifactKind::BindingShim).collect();
        assert_eq!(binaries.len(), 1);
        assert_eq!(shims.len(), 1);
        assert!(binaries[0].descriptor.destination.is_file());
        assert!(shims[0].descriptor.destination.is_file());
        assert_eq!(report.tools.len(), 3);
        assert_eq!(report.ext_suffix, None);
        assert_eq!(
            runner.calls()[3..]
                .iter()
                .map(|c| c.split(' ').take(2).collect::<Vec<_>>().join(" "))
                .collect::<Vec<_>>(),
            ["cmake -S", "cmake --build"]
        );
    }

    #[test]
    fn test_linux_removes_stale_placeholders() {
        let fixture = BuildTreeFixture::new().with_outputs();
        fixture.write_install_file("pyjass.cpython-39-x86_64-linux-gnu.so", b"placeholder");
        fixture.write_install_file("pyjass.cpython-310-x86_64-linux-gnu.so", b"placeholder");
        let runner = MockRunner::new();
        expect_toolchain(&runner);
        expect_cmake_success(&runner);

        build(&fixture.config(HostPlatform::Linux), &requirements(), &runner).unwrap();

        assert!(fixture
            .installed_names()
            .iter()
            .all(|name| !name.starts_with("pyjass.cpython")));
        assert_eq!(fixture.installed_names(), ["_pyjass.so", "pyjass.py"]);
    }

    #[test]
    fn test_macos_probes_suffix_and_copies_placeholder() {
        let fixture = BuildTreeFixture::new().with_outputs();
        let runner = MockRunner::new();
        expect_toolchain(&runner);
        expect_cmake_success(&runner);
        runner.expect_prefix(
            "python3 -c",
            MockProcessOutput::success(".cpython-39-darwin.so\n"),
        );

        let report = build(&fixture.config(HostPlatform::MacOs), &requirements(), &runner)
            .unwrap();

        assert_eq!(report.ext_suffix.as_deref(), Some(".cpython-39-darwin.so"));
        let placeholder = fixture.install_dir().join("dummy.cpython-39-darwin.so");
        assert_eq!(fs::read(placeholder).unwrap(), FAKE_BINARY);
        assert_eq!(
            fs::read(fixture.build_tree().join("_pyjass.so")).unwrap(),
            FAKE_BINARY
        );
        assert_eq!(
            report.artifacts_of(ArtifactKind::PlatformPlaceholder).count(),
            1
        );
        assert_eq!(report.artifacts_of(ArtifactKind::CompiledBinary).count(), 1);
    }

    #[test]
    fn test_explicit_suffix_skips_probe() {
        let fixture = BuildTreeFixture::new().with_outputs();
        let runner = MockRunner::new();
        expect_toolchain(&runner);
        expect_cmake_success(&runner);

        let config = fixture
            .config(HostPlatform::MacOs)
            .with_ext_suffix(".cpython-311-darwin.so");
        build(&config, &requirements(), &runner).unwrap();

        assert_eq!(runner.count_prefix("python3 -c"), 0);
        assert!(fixture
            .install_dir()
            .join("dummy.cpython-311-darwin.so")
            .is_file());
    }

    #[test]
    fn test_unsupported_platform_fails_in_adapt() {
        let fixture = BuildTreeFixture::new().with_outputs();
        let runner = MockRunner::new();
        expect_toolchain(&runner);
        expect_cmake_success(&runner);

        let config = fixture.config(HostPlatform::Unsupported("freebsd".into()));
        let failure = build(&config, &requirements(), &runner).unwrap_err();

        assert_eq!(failure.stage, Stage::AdaptPlatform);
        assert!(matches!(failure.error, PipelineError::UnsupportedPlatform { .. }));
    }

    #[test]
    fn test_reruns_are_idempotent() {
        let fixture = BuildTreeFixture::new().with_outputs();
        let runner = MockRunner::new();
        expect_toolchain(&runner);
        expect_cmake_success(&runner);
        let config = fixture.config(HostPlatform::Linux);

        let first = build(&config, &requirements(), &runner).unwrap();
        let before = snapshot(&fixture.install_dir());
        let second = build(&config, &requirements(), &runner).unwrap();
        let after = snapshot(&fixture.install_dir());

        assert_eq!(before, after);
        let digests = |r: &InstallReport| {
            r.artifacts
                .iter()
                .map(|a| a.sha256.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(digests(&first), digests(&second));
    }

    #[test]
    fn test_macos_reruns_are_idempotent() {
        let fixture = BuildTreeFixture::new().with_outputs();
        fixture.write_install_file("dummy.cpython-38-darwin.so", b"left by python 3.8");
        let runner = MockRunner::new();
        expect_toolchain(&runner);
        expect_cmake_success(&runner);
        runner.expect_prefix(
            "python3 -c",
            MockProcessOutput::success(".cpython-39-darwin.so\n"),
        );
        let config = fixture.config(HostPlatform::MacOs);

        let first = build(&config, &requirements(), &runner).unwrap();
        let before = snapshot(&fixture.install_dir());
        let second = build(&config, &requirements(), &runner).unwrap();
        let after = snapshot(&fixture.install_dir());

        assert_eq!(before, after);
        assert_eq!(
            fixture.installed_names(),
            ["_pyjass.so", "dummy.cpython-39-darwin.so", "pyjass.py"]
        );
        assert_eq!(first.ext_suffix, second.ext_suffix);
        let digests = |r: &InstallReport| {
            r.artifacts
                .iter()
                .map(|a| (a.descriptor.destination.clone(), a.sha256.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(digests(&first), digests(&second));
    }

    #[test]
    fn test_configured_interpreter_is_the_verified_one() {
        let fixture = BuildTreeFixture::new().with_outputs();
        let mut file_config = Config::default();
        file_config.toolchain.insert(
            "python3".to_string(),
            ToolOverride {
                min_version: None,
                program: Some("/opt/py311/bin/python3".to_string()),
            },
        );
        let requirements = file_config.requirements(None).unwrap();
        let interpreter = verified_interpreter(&requirements).unwrap();

        let runner = MockRunner::new();
        runner.expect_prefix("cmake --version", tool_outputs::cmake_version("3.22.1"));
        runner.expect_prefix("swig -version", tool_outputs::swig_version("4.0.2"));
        runner.expect_prefix(
            "/opt/py311/bin/python3 --version",
            tool_outputs::python_version("3.11.4"),
        );
        runner.expect_prefix(
            "/opt/py311/bin/python3 -c",
            MockProcessOutput::success(".cpython-311-darwin.so\n"),
        );
        expect_cmake_success(&runner);

        let config = fixture
            .config(HostPlatform::MacOs)
            .with_interpreter(interpreter);
        let report = build(&config, &requirements, &runner).unwrap();

        assert_eq!(report.ext_suffix.as_deref(), Some(".cpython-311-darwin.so"));
        assert_eq!(runner.count_prefix("python3"), 0);
        let configure = runner
            .calls()
            .into_iter()
            .find(|c| c.starts_with("cmake -S"))
            .unwrap();
        assert!(configure.contains("-DPYTHON_EXECUTABLE=/opt/py311/bin/python3"));
    }

    #[test]
    fn test_events_bracket_every_stage() {
        let fixture = BuildTreeFixture::new().with_outputs();
        let runner = MockRunner::new();
        expect_toolchain(&runner);
        expect_cmake_success(&runner);

        let mut reasons = Vec::new();
        run_pipeline(
            &fixture.config(HostPlatform::Linux),
            &requirements(),
            &runner,
            &mut |event: &PipelineEvent| {
                let json: serde_json::Value = serde_json::from_str(&event.to_json()).unwrap();
                reasons.push(json["reason"].as_str().unwrap().to_string());
            },
        )
        .unwrap();

        assert_eq!(reasons.iter().filter(|r| *r == "stage-started").count(), 6);
        assert_eq!(reasons.iter().filter(|r| *r == "stage-finished").count(), 6);
        assert_eq!(
            reasons.iter().filter(|r| *r == "artifact-installed").count(),
            2
        );
        assert_eq!(reasons.last().map(String::as_str), Some("pipeline-finished"));
    }

    #[test]
    fn test_failure_event_names_stage() {
        let fixture = BuildTreeFixture::new();
        let runner = MockRunner::new();
        runner.expect_not_found("cmake");

        let mut last = None;
        let _ = run_pipeline(
            &fixture.config(HostPlatform::Linux),
            &requirements(),
            &runner,
            &mut |event: &PipelineEvent| last = Some(event.to_json()),
        );

        let last = last.unwrap();
        assert!(last.contains("\"failed_stage\":\"verify-toolchain\""));
        assert!(last.contains("\"error_kind\":\"tool-missing\""));
    }
}
