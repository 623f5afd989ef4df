//! staarctl - record quiz answers and inspect learner progress.

use anyhow::Result;
use clap::Parser;
use staar_common::StaarConfig;
use staarctl::cli::Cli;
use staarctl::commands::{self, Session};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = StaarConfig::load(cli.global.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let session = Session::open(config, &cli.global)?;
    commands::run(&session, cli.command)
}
