//! Descriptors for the files the pipeline moves around.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// What role a file plays in the installed extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    /// The native module produced by the build generator
    CompiledBinary,
    /// Host-language module produced by the interface generator
    BindingShim,
    /// Copy of the compiled binary under the packaging tool's expected name
    PlatformPlaceholder,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::CompiledBinary => write!(f, "compiled binary"),
            ArtifactKind::BindingShim => write!(f, "binding shim"),
            ArtifactKind::PlatformPlaceholder => write!(f, "platform placeholder"),
        }
    }
}

/// Where an artifact comes from and where it must end up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactDescriptor {
    /// Logical name (e.g., "_pyjass")
    pub name: String,

    pub kind: ArtifactKind,

    /// Expected filename in the install directory
    pub filename: String,

    /// Location inside the build tree
    pub source: PathBuf,

    /// Location inside the install directory
    pub destination: PathBuf,
}

impl ArtifactDescriptor {
    pub fn new(
        name: impl Into<String>,
        kind: ArtifactKind,
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
    ) -> Self {
        let destination = destination.into();
        let filename = destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        ArtifactDescriptor {
            name: name.into(),
            kind,
            filename,
            source: source.into(),
            destination,
        }
    }

    /// Same source, different destination (used for placeholder copies).
    pub fn redirect(&self, kind: ArtifactKind, destination: impl Into<PathBuf>) -> Self {
        ArtifactDescriptor::new(self.name.clone(), kind, self.source.clone(), destination)
    }
}

/// An artifact written to the install directory, with its content digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledArtifact {
    #[serde(flatten)]
    pub descriptor: ArtifactDescriptor,

    /// Hex-encoded SHA-256 of the installed file
    pub sha256: String,
}
