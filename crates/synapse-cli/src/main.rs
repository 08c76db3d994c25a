//! # synapse-contract CLI entry point
//!
//! Parses command-line arguments, resolves configuration and dispatches to
//! subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use synapse_cli::config::CliConfig;
use synapse_cli::events::{run_events, EventsArgs};
use synapse_cli::inspect::{run_inspect, InspectArgs};
use synapse_cli::probe::{run_probe, ProbeArgs};
use synapse_cli::validate::{run_validate, ValidateArgs};
use synapse_cli::EXIT_ERROR;

/// Synapse contract tooling.
///
/// Compiles OpenAPI and AsyncAPI contracts into validators and checks HTTP
/// responses and event payloads against them.
#[derive(Parser, Debug)]
#[command(name = "synapse-contract", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the schemas, channels and operations a contract declares.
    Inspect(InspectArgs),

    /// Validate payload files against a named schema.
    Validate(ValidateArgs),

    /// Run a manifest of event cases against an AsyncAPI contract.
    Events(EventsArgs),

    /// Run HTTP cases against a live service.
    Probe(ProbeArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = match CliConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::from(EXIT_ERROR);
        }
    };
    tracing::debug!(?config, "resolved configuration");

    let result = match cli.command {
        Commands::Inspect(args) => run_inspect(&args, &config),
        Commands::Validate(args) => run_validate(&args, &config),
        Commands::Events(args) => run_events(&args, &config),
        Commands::Probe(args) => run_probe(&args, &config),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}
