//! Configuration parsing and validation.
//!
//! Tessera configuration is loaded from TOML files with CLI overrides.
//! The `[lease]` section carries the ticket-range and timing knobs; zero
//! values there mean "keep the built-in default" (see
//! `lease::settings::LeaseSettings::resolve` for the resolution rules).

use crate::lease::settings::{
    LeaseSettings, DEFAULT_MAX_VALUE, DEFAULT_MIN_VALUE, DEFAULT_POOL_VOLUME, DEFAULT_TTF,
    DEFAULT_TTL,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Top-level Tessera configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Lease pool configuration.
    #[serde(default)]
    pub lease: LeaseConfig,

    /// Listener configuration for protocol adapters.
    #[serde(default)]
    pub listeners: ListenerConfig,

    /// Telemetry configuration.
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Filesystem paths.
    #[serde(default)]
    pub paths: PathConfig,

    /// Snapshot persistence configuration.
    #[serde(default)]
    pub snapshot: SnapshotConfig,
}

/// Lease pool configuration.
///
/// Zero values are treated as "unset": resolution keeps the built-in
/// default for that field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaseConfig {
    /// Max tickets pre-generated per allocation pass.
    #[serde(default = "default_pool_volume")]
    pub pool_volume: u32,

    /// Renewal deadline for rented tickets, in milliseconds.
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,

    /// Cooldown before a frozen ticket is recyclable, in milliseconds.
    #[serde(default = "default_ttf_ms")]
    pub ttf_ms: u64,

    /// Inclusive lower bound of the ticket range.
    #[serde(default = "default_min_value")]
    pub min_value: u32,

    /// Exclusive upper bound of the ticket range.
    #[serde(default = "default_max_value")]
    pub max_value: u32,
}

impl Default for LeaseConfig {
    fn default() -> Self {
        Self {
            pool_volume: default_pool_volume(),
            ttl_ms: default_ttl_ms(),
            ttf_ms: default_ttf_ms(),
            min_value: default_min_value(),
            max_value: default_max_value(),
        }
    }
}

/// Listener configuration for protocol adapters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListenerConfig {
    /// gRPC listener for the lease adapter. Absent means the listener is
    /// disabled (the worker still runs and is reachable in-process).
    #[serde(default)]
    pub grpc: Option<GrpcListenerConfig>,
}

/// gRPC listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrpcListenerConfig {
    /// Bind address (e.g., "127.0.0.1:4180").
    pub bind: String,
}

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Filesystem path configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    /// Storage directory for snapshots.
    #[serde(default = "default_storage_dir")]
    pub storage_dir: String,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
        }
    }
}

/// Snapshot persistence configuration.
///
/// Disabled by default: the worker then starts with an empty busy
/// registry and a freshly allocated pool on every process start.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Load a snapshot at startup and write one at graceful shutdown.
    #[serde(default)]
    pub enabled: bool,
}

// Default value functions

fn default_pool_volume() -> u32 {
    DEFAULT_POOL_VOLUME
}

fn default_ttl_ms() -> u64 {
    DEFAULT_TTL.as_millis() as u64
}

fn default_ttf_ms() -> u64 {
    DEFAULT_TTF.as_millis() as u64
}

fn default_min_value() -> u32 {
    DEFAULT_MIN_VALUE
}

fn default_max_value() -> u32 {
    DEFAULT_MAX_VALUE
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_storage_dir() -> String {
    "data".to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Config =
            toml::from_str(&content).with_context(|| "failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).with_context(|| "failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Apply CLI overrides to the configuration.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref log_level) = overrides.log_level {
            self.telemetry.log_level = log_level.clone();
        }
        if let Some(ref storage_dir) = overrides.storage_dir {
            self.paths.storage_dir = storage_dir.clone();
        }
        if let Some(ref grpc_bind) = overrides.grpc_bind {
            self.listeners.grpc = Some(GrpcListenerConfig {
                bind: grpc_bind.clone(),
            });
        }
    }

    /// Validate configuration consistency.
    ///
    /// Configuration errors fail here, before the worker starts, rather
    /// than surfacing as runtime errors.
    pub fn validate(&self) -> Result<()> {
        self.lease_settings()?;
        self.validate_telemetry()?;
        self.validate_listeners()?;
        Ok(())
    }

    /// Resolve the `[lease]` section into validated settings.
    pub fn lease_settings(&self) -> Result<LeaseSettings> {
        LeaseSettings::resolve(&self.lease).context("invalid [lease] configuration")
    }

    /// Path of the snapshot file inside the storage directory.
    pub fn snapshot_path(&self) -> PathBuf {
        PathBuf::from(&self.paths.storage_dir).join("lease.snapshot")
    }

    fn validate_telemetry(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.telemetry.log_level.as_str()) {
            anyhow::bail!(
                "telemetry.log_level must be one of {:?}, got: {}",
                valid_levels,
                self.telemetry.log_level
            );
        }
        Ok(())
    }

    fn validate_listeners(&self) -> Result<()> {
        if let Some(ref grpc) = self.listeners.grpc {
            grpc.bind
                .parse::<SocketAddr>()
                .with_context(|| format!("invalid listeners.grpc.bind address: {}", grpc.bind))?;
        }
        Ok(())
    }
}

/// CLI override options that can be applied to configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Override log level.
    pub log_level: Option<String>,
    /// Override storage directory.
    pub storage_dir: Option<String>,
    /// Override gRPC bind address.
    pub grpc_bind: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.lease.pool_volume, 100);
        assert_eq!(config.lease.min_value, 100_000);
        assert_eq!(config.lease.max_value, 200_000);
        assert_eq!(config.telemetry.log_level, "info");
        assert!(config.listeners.grpc.is_none());
        assert!(!config.snapshot.enabled);
    }

    #[test]
    fn lease_section_overrides() {
        let config = Config::from_toml(
            r#"
[lease]
min_value = 2
max_value = 5
ttl_ms = 1000
ttf_ms = 1000
"#,
        )
        .unwrap();
        let settings = config.lease_settings().unwrap();
        assert_eq!(settings.min_value, 2);
        assert_eq!(settings.max_value, 5);
        // pool_volume clamps to the tiny capacity.
        assert_eq!(settings.pool_volume, 3);
    }

    #[test]
    fn invalid_range_rejected_at_parse() {
        let err = Config::from_toml(
            r#"
[lease]
min_value = 10
max_value = 10
"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn invalid_log_level_rejected() {
        let err = Config::from_toml(
            r#"
[telemetry]
log_level = "verbose"
"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn invalid_bind_rejected() {
        let err = Config::from_toml(
            r#"
[listeners.grpc]
bind = "not-an-address"
"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn overrides_apply() {
        let mut config = Config::from_toml("").unwrap();
        config.apply_overrides(&ConfigOverrides {
            log_level: Some("debug".into()),
            storage_dir: Some("/tmp/tessera".into()),
            grpc_bind: Some("127.0.0.1:4180".into()),
        });
        assert_eq!(config.telemetry.log_level, "debug");
        assert_eq!(config.paths.storage_dir, "/tmp/tessera");
        assert_eq!(config.listeners.grpc.unwrap().bind, "127.0.0.1:4180");
    }

    #[test]
    fn snapshot_path_joins_storage_dir() {
        let config = Config::from_toml(
            r#"
[paths]
storage_dir = "/var/lib/tessera"
"#,
        )
        .unwrap();
        assert_eq!(
            config.snapshot_path(),
            PathBuf::from("/var/lib/tessera/lease.snapshot")
        );
    }
}
