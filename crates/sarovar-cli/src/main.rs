//! GeoSarovar CLI - Command-line interface
//!
//! Runs the dashboard's ROI and analysis lifecycle from a terminal.

mod cli;
mod commands;
mod config_loader;
mod errors;
mod interactive;
mod output;
mod output_types;
mod progress;
mod render;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use errors::CliError;

fn main() -> Result<()> {
    // Logs go to stderr so --json output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match commands::execute(cli) {
        Ok(()) => Ok(()),
        Err(e) => match e.downcast_ref::<CliError>() {
            Some(cli_error) => {
                cli_error.display();
                std::process::exit(1);
            }
            None => Err(e),
        },
    }
}
