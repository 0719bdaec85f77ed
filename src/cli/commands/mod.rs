//! CLI command implementations.

mod config;
mod snapshot;
mod start;

pub use config::{run_config, ConfigArgs};
pub use snapshot::{run_snapshot, SnapshotArgs};
pub use start::{run_start_with_config, StartArgs};
