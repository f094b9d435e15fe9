//! Installing the binding shim and finalizing the install directory.

use crate::builder::error::PipelineError;
use crate::builder::locate::LocatedArtifacts;
use crate::core::artifact::{ArtifactDescriptor, ArtifactKind, InstalledArtifact};
use crate::core::configuration::BuildConfiguration;
use crate::util::fs::{atomic_copy, ensure_dir, remove_matching};
use crate::util::hash::sha256_file;

pub struct BindingInstaller<'a> {
    config: &'a BuildConfiguration,
}

impl<'a> BindingInstaller<'a> {
    pub fn new(config: &'a BuildConfiguration) -> Self {
        BindingInstaller { config }
    }

    /// Copy the shim next to the already placed binaries, sweep stale
    /// placeholders and digest everything that was installed.
    ///
    /// `placed` are the descriptors the platform adapter wrote; they are kept
    /// by the sweep and come first in the returned list.
    pub fn install(
        &self,
        located: &LocatedArtifacts,
        placed: Vec<ArtifactDescriptor>,
    ) -> Result<Vec<InstalledArtifact>, PipelineError> {
        let shim = &located.shim;
        if !shim.source.is_file() {
            return Err(PipelineError::ArtifactNotFound {
                kind: ArtifactKind::BindingShim,
                path: shim.source.clone(),
            });
        }

        let out = self.config.output_dir();
        ensure_dir(out).map_err(|e| PipelineError::filesystem("create install directory", out, e))?;

        atomic_copy(&shim.source, &shim.destination)
            .map_err(|e| PipelineError::filesystem("install", &shim.destination, e))?;

        let mut descriptors = placed;
        descriptors.push(shim.clone());

        let keep: Vec<_> = descriptors.iter().map(|d| d.destination.clone()).collect();
        remove_matching(out, &self.config.layout.stale_patterns, &keep)
            .map_err(|e| PipelineError::filesystem("remove stale placeholders in", out, e))?;

        descriptors
            .into_iter()
            .map(|descriptor| {
                let sha256 = sha256_file(&descriptor.destination)
                    .map_err(|e| PipelineError::filesystem("hash", &descriptor.destination, e))?;
                Ok(InstalledArtifact { descriptor, sha256 })
            })
            .collect()
    }
}
