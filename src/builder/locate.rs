//! Locating generator outputs in the build tree.

use serde::Serialize;

use crate::builder::error::PipelineError;
use crate::core::artifact::{ArtifactDescriptor, ArtifactKind};
use crate::core::configuration::BuildConfiguration;

/// The two outputs a successful build leaves in the build tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocatedArtifacts {
    pub binary: ArtifactDescriptor,
    pub shim: ArtifactDescriptor,
}

/// Computes where artifacts are and where they go.
pub struct ArtifactLocator<'a> {
    config: &'a BuildConfiguration,
}

impl<'a> ArtifactLocator<'a> {
    pub fn new(config: &'a BuildConfiguration) -> Self {
        ArtifactLocator { config }
    }

    /// Descriptor for the compiled binary. Does not touch the filesystem.
    pub fn binary(&self) -> ArtifactDescriptor {
        let layout = &self.config.layout;
        let filename = layout.binary_name(&self.config.platform);

        ArtifactDescriptor::new(
            format!("_{}", layout.module),
            ArtifactKind::CompiledBinary,
            self.config.build_tree().join(&filename),
            self.config.output_dir().join(&filename),
        )
    }

    /// Descriptor for the binding shim. Does not touch the filesystem.
    pub fn shim(&self) -> ArtifactDescriptor {
        let layout = &self.config.layout;

        ArtifactDescriptor::new(
            layout.module.clone(),
            ArtifactKind::BindingShim,
            self.config.build_tree().join(&layout.shim),
            self.config.output_dir().join(layout.shim_name()),
        )
    }

    /// Compute both descriptors and check that the compiled binary exists.
    ///
    /// A missing shim is reported later, by the installer.
    pub fn locate(&self) -> Result<LocatedArtifacts, PipelineError> {
        let binary = self.binary();
        if !binary.source.is_file() {
            return Err(PipelineError::ArtifactNotFound {
                kind: binary.kind,
                path: binary.source,
            });
        }
        tracing::debug!("found {} at {}", binary.kind, binary.source.display());

        Ok(LocatedArtifacts {
            binary,
            shim: self.shim(),
        })
    }
}
