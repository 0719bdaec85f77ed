//! Tessera - unified CLI entrypoint.
//!
//! Usage:
//!   tessera start --config config/tessera.toml
//!   tessera config validate --config config/tessera.toml
//!   tessera config show [--format json]
//!   tessera snapshot inspect <path>

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tessera::cli::commands::{run_config, run_snapshot, run_start_with_config};
use tessera::cli::{Cli, Commands};
use tessera::core::config::ConfigOverrides;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Determine config path - use global --config or default
    let config_path = cli
        .config
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config/tessera.toml"));

    let overrides = ConfigOverrides {
        log_level: cli.log_level,
        ..Default::default()
    };

    match cli.command {
        Commands::Start(_args) => run_start_with_config(&config_path, &overrides).await,
        Commands::Config(args) => run_config(args),
        Commands::Snapshot(args) => run_snapshot(args),
    }
}
