//! Common test utilities.
//!
//! This module contains shared helpers for integration tests.
//! Import with `mod common;` in test files.

use std::io::Write;
use tempfile::NamedTempFile;
use tessera::core::config::{Config, LeaseConfig};
use tessera::lease::settings::LeaseSettings;
use tessera::lease::worker::{LeaseHandle, LeaseWorker};
use tokio::sync::watch;

/// Create a minimal valid configuration file.
pub fn create_minimal_config() -> NamedTempFile {
    let config_content = r#"
[lease]
min_value = 2
max_value = 5
ttl_ms = 1000
ttf_ms = 1000

[telemetry]
log_level = "info"
"#;

    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(config_content.as_bytes())
        .expect("Failed to write config");
    file
}

/// Create a configuration file with custom lease bounds.
pub fn create_config_with_range(min_value: u32, max_value: u32) -> NamedTempFile {
    let config_content = format!(
        r#"
[lease]
min_value = {}
max_value = {}
"#,
        min_value, max_value
    );

    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(config_content.as_bytes())
        .expect("Failed to write config");
    file
}

/// Load a config from a temp file.
pub fn load_config(file: &NamedTempFile) -> Config {
    Config::from_file(file.path()).expect("Failed to load config")
}

/// Resolve lease settings for a small test range.
pub fn test_settings(min_value: u32, max_value: u32, ttl_ms: u64, ttf_ms: u64) -> LeaseSettings {
    LeaseSettings::resolve(&LeaseConfig {
        pool_volume: 0,
        ttl_ms,
        ttf_ms,
        min_value,
        max_value,
    })
    .expect("Failed to resolve settings")
}

/// Spawn a lease worker; the returned sender keeps it alive and can
/// signal shutdown.
pub fn spawn_worker(settings: LeaseSettings) -> (LeaseHandle, watch::Sender<bool>) {
    let (worker, handle) = LeaseWorker::new(settings);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(worker.run(shutdown_rx));
    (handle, shutdown_tx)
}

/// Create a temporary directory for test data.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Assert that a result is Ok and return the value.
#[track_caller]
pub fn assert_ok<T, E: std::fmt::Debug>(result: Result<T, E>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("Expected Ok, got Err: {:?}", e),
    }
}

/// Assert that a result is Err.
#[track_caller]
pub fn assert_err<T: std::fmt::Debug, E>(result: Result<T, E>) -> E {
    match result {
        Ok(v) => panic!("Expected Err, got Ok: {:?}", v),
        Err(e) => e,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_minimal_config() {
        let file = create_minimal_config();
        let config = load_config(&file);
        assert_eq!(config.lease.min_value, 2);
        assert_eq!(config.lease.max_value, 5);
    }

    #[test]
    fn test_create_config_with_range() {
        let file = create_config_with_range(10, 30);
        let config = load_config(&file);
        assert_eq!(config.lease_settings().unwrap().capacity(), 20);
    }

    #[test]
    fn test_assert_ok() {
        let result: Result<i32, &str> = Ok(42);
        assert_eq!(assert_ok(result), 42);
    }

    #[test]
    fn test_assert_err() {
        let result: Result<i32, &str> = Err("error");
        assert_eq!(assert_err(result), "error");
    }

    #[test]
    fn test_temp_test_dir() {
        let dir = temp_test_dir();
        assert!(dir.path().exists());
    }
}
