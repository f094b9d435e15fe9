//! Host platform identification.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Host operating system, as far as artifact naming is concerned.
///
/// Only Linux and macOS have known extension-naming rules. Everything else
/// is carried as [`HostPlatform::Unsupported`] with the raw OS name so the
/// adapter can refuse it explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HostPlatform {
    Linux,
    MacOs,
    Unsupported(String),
}

impl HostPlatform {
    /// Detect the platform this binary is running on.
    pub fn host() -> Self {
        Self::from_os_name(std::env::consts::OS)
    }

    /// Map an OS name as reported by `std::env::consts::OS`.
    pub fn from_os_name(os: &str) -> Self {
        match os {
            "linux" => HostPlatform::Linux,
            "macos" | "darwin" => HostPlatform::MacOs,
            other => HostPlatform::Unsupported(other.to_string()),
        }
    }

    /// Suffix the build generator gives the compiled extension module.
    ///
    /// CPython loads plain `.so` modules on both Linux and macOS; Windows
    /// uses `.pyd`, which is reported here so error messages can name the
    /// file even though the platform is refused later on.
    pub fn module_suffix(&self) -> &'static str {
        match self {
            HostPlatform::Linux | HostPlatform::MacOs => ".so",
            HostPlatform::Unsupported(os) if os == "windows" => ".pyd",
            HostPlatform::Unsupported(_) => ".so",
        }
    }

    /// Pick the install hint matching this platform.
    pub fn install_hint<'a>(&self, hints: &'a InstallHints) -> &'a str {
        match self {
            HostPlatform::Linux => &hints.linux,
            HostPlatform::MacOs => &hints.macos,
            HostPlatform::Unsupported(_) => &hints.other,
        }
    }
}

impl fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostPlatform::Linux => write!(f, "linux"),
            HostPlatform::MacOs => write!(f, "macos"),
            HostPlatform::Unsupported(os) => write!(f, "{}", os),
        }
    }
}

impl FromStr for HostPlatform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "" => Err("platform name must not be empty".to_string()),
            other => Ok(Self::from_os_name(other)),
        }
    }
}

/// Per-platform installation instructions for a tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallHints {
    pub linux: String,
    pub macos: String,
    pub other: String,
}

impl InstallHints {
    pub fn new(
        linux: impl Into<String>,
        macos: impl Into<String>,
        other: impl Into<String>,
    ) -> Self {
        InstallHints {
            linux: linux.into(),
            macos: macos.into(),
            other: other.into(),
        }
    }
}
