//! Pipeline stages.
//!
//! Each stage is a small type borrowing the [`BuildConfiguration`] it works
//! on; stages that launch processes do so through a
//! [`CommandRunner`](crate::util::process::CommandRunner).
//!
//! [`BuildConfiguration`]: crate::core::BuildConfiguration

pub mod adapt;
pub mod cmake;
pub mod error;
pub mod events;
pub mod install;
pub mod locate;
pub mod toolchain;

pub use adapt::PlatformAdapter;
pub use cmake::BuildInvoker;
pub use error::{PipelineError, PipelineFailure, Stage};
pub use events::PipelineEvent;
pub use install::BindingInstaller;
pub use locate::{ArtifactLocator, LocatedArtifacts};
pub use toolchain::{probe_ext_suffix, ToolchainVerifier, VerifiedTool};
