//! Config command implementation.

use crate::core::config::Config;
use anyhow::Result;
use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};

/// Configuration operations.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Validate configuration file.
    Validate {
        /// Config file path.
        #[arg(short, long, default_value = "config/tessera.toml")]
        config: PathBuf,
    },
    /// Print the resolved configuration with defaults applied.
    Show {
        /// Config file path.
        #[arg(short, long, default_value = "config/tessera.toml")]
        config: PathBuf,
        /// Output format (toml, json).
        #[arg(long, default_value = "toml")]
        format: String,
    },
}

/// Run the config command.
pub fn run_config(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommand::Validate { config } => validate_config(&config),
        ConfigCommand::Show { config, format } => show_config(&config, &format),
    }
}

fn validate_config(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("Config file not found: {:?}", path);
    }

    let config = Config::from_file(path)?;
    let settings = config.lease_settings()?;

    println!("✓ Config file is valid");
    println!(
        "  ticket range: [{}, {}) (capacity {})",
        settings.min_value,
        settings.max_value,
        settings.capacity()
    );
    println!(
        "  ttl: {}ms, ttf: {}ms, pool volume: {}",
        settings.ttl.as_millis(),
        settings.ttf.as_millis(),
        settings.pool_volume
    );
    if config.listeners.grpc.is_none() {
        println!("  ⚠ Warning: no [listeners.grpc] section; server will not be reachable");
    }

    Ok(())
}

fn show_config(path: &Path, format: &str) -> Result<()> {
    let config = if path.exists() {
        Config::from_file(path)?
    } else {
        Config::default()
    };

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
        _ => {
            // Default to TOML output
            let toml = toml::to_string_pretty(&config)?;
            println!("{}", toml);
        }
    }

    Ok(())
}
