//! accident-zinb - Main Entry Point
//!
//! Trains one ZINB model per target version and writes the ranked
//! feature-importance reports.

use accident_zinb::cli::{run_cli, Cli};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "accident_zinb=info".into()),
        )
        .init();

    let cli = Cli::parse();
    run_cli(&cli)
}
