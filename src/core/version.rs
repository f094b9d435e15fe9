//! Tool version extraction and comparison.
//!
//! External tools report their version as free-form banners
//! (`cmake version 3.22.1`, `SWIG Version 4.0.2`, `Python 3.9.7`). A
//! [`VersionParser`] pulls a `major.minor` pair out of such text; the
//! resulting [`ToolVersion`] orders major first, then minor.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use anyhow::{bail, Context, Result};
use regex::Regex;
use thiserror::Error;

/// Pattern used when a tool does not declare its own.
pub const GENERIC_VERSION_PATTERN: &str = r"(\d+)\.(\d+)";

static GENERIC_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(GENERIC_VERSION_PATTERN).expect("generic version pattern is valid"));

/// A comparable `major.minor` tool version.
///
/// Stored as a [`semver::Version`] with the patch component pinned to zero,
/// so equality and ordering only ever look at major and minor.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ToolVersion(semver::Version);

impl ToolVersion {
    pub fn new(major: u64, minor: u64) -> Self {
        ToolVersion(semver::Version::new(major, minor, 0))
    }

    pub fn major(&self) -> u64 {
        self.0.major
    }

    pub fn minor(&self) -> u64 {
        self.0.minor
    }

    /// Whether this version satisfies `minimum` (inclusive).
    pub fn meets(&self, minimum: &ToolVersion) -> bool {
        self >= minimum
    }
}

impl fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0.major, self.0.minor)
    }
}

impl FromStr for ToolVersion {
    type Err = UnparsableVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        extract(&GENERIC_VERSION, s)
    }
}

impl serde::Serialize for ToolVersion {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for ToolVersion {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// No version could be found in a tool's output.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("no version matching `{pattern}` found")]
pub struct UnparsableVersion {
    pub pattern: String,
}

/// Extracts a [`ToolVersion`] from raw tool output.
pub trait VersionParser: fmt::Debug {
    fn parse(&self, text: &str) -> Result<ToolVersion, UnparsableVersion>;
}

/// A [`VersionParser`] driven by a regex with two numeric capture groups.
///
/// The first match wins; group 1 is the major and group 2 the minor number.
#[derive(Debug, Clone)]
pub struct RegexVersionParser {
    regex: Regex,
}

impl RegexVersionParser {
    /// Compile a pattern. It must contain at least two capture groups.
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .with_context(|| format!("invalid version pattern `{}`", pattern))?;

        // captures_len counts the implicit whole-match group
        if regex.captures_len() < 3 {
            bail!(
                "version pattern `{}` needs two capture groups (major, minor)",
                pattern
            );
        }

        Ok(RegexVersionParser { regex })
    }

    /// Parser for plain `major.minor` anywhere in the text.
    pub fn generic() -> Self {
        RegexVersionParser {
            regex: GENERIC_VERSION.clone(),
        }
    }
}

impl VersionParser for RegexVersionParser {
    fn parse(&self, text: &str) -> Result<ToolVersion, UnparsableVersion> {
        extract(&self.regex, text)
    }
}

fn extract(regex: &Regex, text: &str) -> Result<ToolVersion, UnparsableVersion> {
    let unparsable = || UnparsableVersion {
        pattern: regex.as_str().to_string(),
    };

    let caps = regex.captures(text).ok_or_else(unparsable)?;
    let major = caps
        .get(1)
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(unparsable)?;
    let minor = caps
        .get(2)
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(unparsable)?;

    Ok(ToolVersion::new(major, minor))
}
