//! CLI definitions using clap.

use std::path::PathBuf;

use clap::builder::FalseyValueParser;
use clap::{Args, Parser, Subcommand, ValueEnum};

use extforge::core::HostPlatform;
use extforge::util::shell::ColorChoice;

/// extforge - build orchestrator for native Python extensions
#[derive(Parser)]
#[command(name = "extforge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto", env = "EXTFORGE_COLOR")]
    pub color: ColorChoice,

    /// Output format for messages
    #[arg(long, global = true, value_enum, default_value_t = MessageFormat::Human)]
    pub message_format: MessageFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MessageFormat {
    Human,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Verify the toolchain, build the extension and install it
    Build(BuildArgs),

    /// Check the toolchain without building anything
    Doctor(DoctorArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct BuildArgs {
    /// Temporary directory CMake builds into
    #[arg(long, value_name = "DIR", env = "EXTFORGE_BUILD_TEMP")]
    pub build_temp: PathBuf,

    /// Directory the extension is installed into
    #[arg(long, value_name = "DIR", env = "EXTFORGE_INSTALL_DIR")]
    pub install_dir: PathBuf,

    /// Directory containing the top-level CMakeLists.txt
    #[arg(long, value_name = "DIR", default_value = ".", env = "EXTFORGE_SOURCE_DIR")]
    pub source_dir: PathBuf,

    /// Build in debug mode (also enabled by DEBUG=1)
    #[arg(long, env = "EXTFORGE_DEBUG", value_parser = FalseyValueParser::new())]
    pub debug: bool,

    /// Number of parallel jobs
    #[arg(short, long, env = "EXTFORGE_JOBS")]
    pub jobs: Option<usize>,

    /// Platform to install for (defaults to the host)
    #[arg(long, value_name = "OS", env = "EXTFORGE_PLATFORM")]
    pub platform: Option<HostPlatform>,

    /// Interpreter extension suffix, e.g. `.cpython-39-darwin.so`
    #[arg(long, value_name = "SUFFIX", env = "EXTFORGE_EXT_SUFFIX")]
    pub ext_suffix: Option<String>,

    /// Package version exported to the compiler as VERSION_INFO
    #[arg(long, value_name = "VERSION", env = "EXTFORGE_PACKAGE_VERSION")]
    pub package_version: Option<String>,

    /// Python interpreter to build for
    #[arg(long, value_name = "PATH", env = "EXTFORGE_PYTHON")]
    pub python: Option<String>,

    /// CMake generator
    #[arg(short = 'G', long, env = "EXTFORGE_GENERATOR")]
    pub generator: Option<String>,

    /// Extra CMake definition
    #[arg(short = 'D', long = "define", value_name = "KEY=VALUE", value_parser = parse_define)]
    pub defines: Vec<(String, String)>,
}

#[derive(Args)]
pub struct DoctorArgs {
    /// Directory containing extforge.toml
    #[arg(long, value_name = "DIR", default_value = ".", env = "EXTFORGE_SOURCE_DIR")]
    pub source_dir: PathBuf,

    /// Python interpreter to check
    #[arg(long, value_name = "PATH", env = "EXTFORGE_PYTHON")]
    pub python: Option<String>,

    /// Platform to check for (defaults to the host)
    #[arg(long, value_name = "OS", env = "EXTFORGE_PLATFORM")]
    pub platform: Option<HostPlatform>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

fn parse_define(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got `{}`", raw)),
    }
}
