//! # apicheck CLI entry point
//!
//! Parses command-line arguments, builds the schema registry once, and
//! dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use apicheck_cli::check::{
    run_check_request, run_check_response, CheckRequestArgs, CheckResponseArgs,
};
use apicheck_cli::inspect::{run_schemas, run_show, SchemasArgs, ShowArgs};
use apicheck_cli::replay::{run_replay, ReplayArgs};
use apicheck_cli::resolve_config;
use apicheck_schema::SchemaRegistry;

/// Validate HTTP bodies against OpenAPI specifications.
///
/// Loads one specification file per module from the spec directory,
/// resolves `$ref` references across files, and checks response and
/// request bodies against the resulting schemas.
#[derive(Parser, Debug)]
#[command(name = "apicheck", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file (YAML or JSON).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the per-module specification files.
    #[arg(long, global = true)]
    spec_dir: Option<PathBuf>,

    /// Prefix stripped from endpoints before lookup (default `/api/v1`).
    #[arg(long, global = true)]
    api_prefix: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List indexed schema keys per module.
    Schemas(SchemasArgs),

    /// Print one resolved schema as JSON.
    Show(ShowArgs),

    /// Validate a response body.
    CheckResponse(CheckResponseArgs),

    /// Validate a request body.
    CheckRequest(CheckRequestArgs),

    /// Validate every call in a recorded transcript.
    Replay(ReplayArgs),
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
        .with_writer(std::io::stderr)
        .init();

    let config = match resolve_config(
        cli.config.as_deref(),
        cli.spec_dir.as_deref(),
        cli.api_prefix.as_deref(),
    ) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(2);
        }
    };
    tracing::debug!(
        spec_dir = %config.spec_dir.display(),
        api_prefix = %config.api_prefix,
        "configuration resolved"
    );

    let registry = SchemaRegistry::load(config);

    let result = match &cli.command {
        Commands::Schemas(args) => run_schemas(args, &registry),
        Commands::Show(args) => run_show(args, &registry),
        Commands::CheckResponse(args) => run_check_response(args, &registry),
        Commands::CheckRequest(args) => run_check_request(args, &registry),
        Commands::Replay(args) => run_replay(args, &registry),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
