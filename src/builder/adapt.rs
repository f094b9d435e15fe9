//! Platform-specific placement of the compiled binary.
//!
//! On Linux the binary is installed under its own name and any placeholder
//! the packaging tool registered is swept away. On macOS the packaging tool
//! insists on finding its placeholder (`dummy<EXT_SUFFIX>`), so the binary
//! is installed under its own name *and* copied over the placeholder name.

use crate::builder::error::PipelineError;
use crate::builder::locate::LocatedArtifacts;
use crate::core::artifact::{ArtifactDescriptor, ArtifactKind};
use crate::core::configuration::BuildConfiguration;
use crate::core::platform::HostPlatform;
use crate::util::fs::{atomic_copy, ensure_dir, remove_matching};

pub struct PlatformAdapter<'a> {
    config: &'a BuildConfiguration,
    ext_suffix: Option<&'a str>,
}

impl<'a> PlatformAdapter<'a> {
    /// `ext_suffix` defaults to the one in `config` when not given.
    pub fn new(config: &'a BuildConfiguration, ext_suffix: Option<&'a str>) -> Self {
        PlatformAdapter {
            config,
            ext_suffix: ext_suffix.or(config.ext_suffix.as_deref()),
        }
    }

    /// Place the compiled binary for the configured platform.
    ///
    /// Returns the descriptors written to the install directory.
    pub fn adapt(&self, located: &LocatedArtifacts) -> Result<Vec<ArtifactDescriptor>, PipelineError> {
        let out = self.config.output_dir();

        match &self.config.platform {
            HostPlatform::Linux => {
                ensure_dir(out)
                    .map_err(|e| PipelineError::filesystem("create install directory", out, e))?;
                install(&located.binary)?;

                let removed = remove_matching(
                    out,
                    &self.config.layout.stale_patterns,
                    &[located.binary.destination.clone()],
                )
                .map_err(|e| PipelineError::filesystem("remove stale placeholders in", out, e))?;
                for path in &removed {
                    tracing::info!("removed stale placeholder {}", path.display());
                }

                Ok(vec![located.binary.clone()])
            }
            HostPlatform::MacOs => {
                ensure_dir(out)
                    .map_err(|e| PipelineError::filesystem("create install directory", out, e))?;
                install(&located.binary)?;

                let suffix = self.ext_suffix.unwrap_or(self.config.platform.module_suffix());
                let placeholder = located.binary.redirect(
                    ArtifactKind::PlatformPlaceholder,
                    out.join(self.config.layout.placeholder_name(suffix)),
                );
                install(&placeholder)?;

                Ok(vec![located.binary.clone(), placeholder])
            }
            HostPlatform::Unsupported(os) => {
                Err(PipelineError::UnsupportedPlatform { os: os.clone() })
            }
        }
    }
}

fn install(artifact: &ArtifactDescriptor) -> Result<(), PipelineError> {
    let bytes = atomic_copy(&artifact.source, &artifact.destination)
        .map_err(|e| PipelineError::filesystem("install", &artifact.destination, e))?;
    tracing::debug!(
        "copied {} ({} bytes) to {}",
        artifact.source.display(),
        bytes,
        artifact.destination.display()
    );
    Ok(())
}
