//! Vessel Tally - container movement summaries from photographed report tables
//!
//! A CLI tool that reads vessel operation report photos with a multimodal
//! model, reconciles the cells into one summary row per vessel and exports
//! the session table.

use clap::Parser;
use tally_cli::cli::Cli;
use tally_cli::commands;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = commands::execute(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins; otherwise warnings, or debug with `-v`
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}
