//! Core data model: versions, requirements, platforms, configuration and
//! artifact descriptors.

pub mod artifact;
pub mod configuration;
pub mod platform;
pub mod requirement;
pub mod version;

pub use artifact::{ArtifactDescriptor, ArtifactKind, InstalledArtifact};
pub use configuration::{BuildConfiguration, BuildMode, ExtensionLayout};
pub use platform::{HostPlatform, InstallHints};
pub use requirement::ToolchainRequirement;
pub use version::{RegexVersionParser, ToolVersion, VersionParser};
