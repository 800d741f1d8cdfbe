//! Archivist CLI - Command-line utility for building zip and tar.gz
//! archives with checksums.

mod cli;
mod commands;
mod error;
mod manifest;
mod output;

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let formatter = output::create_formatter(cli.json, cli.verbose, cli.quiet);

    let (operation, result) = match &cli.command {
        cli::Commands::Create(args) => ("create", commands::create::execute(args, &*formatter)),
        cli::Commands::Checksum(args) => ("checksum", commands::checksum::execute(args, &*formatter)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            formatter.format_error(operation, &err);
            ExitCode::FAILURE
        }
    }
}
