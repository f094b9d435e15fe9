//! extforge CLI - build orchestrator for native Python extensions

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands, MessageFormat};
use extforge::util::Shell;

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Status lines come from the Shell; logging only adds detail.
    let filter = if cli.verbose {
        EnvFilter::new("extforge=debug")
    } else {
        EnvFilter::new("extforge=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let shell = Shell::from_flags(
        cli.quiet,
        cli.verbose,
        cli.color,
        cli.message_format == MessageFormat::Json,
    );

    match cli.command {
        Commands::Build(args) => commands::build::execute(args, &shell),
        Commands::Doctor(args) => commands::doctor::execute(args, &shell),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
