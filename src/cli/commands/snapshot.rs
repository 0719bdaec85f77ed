//! Snapshot command implementation.

use crate::storage::snapshot_store::SnapshotStore;
use anyhow::Result;
use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Snapshot operations.
#[derive(Args, Debug)]
pub struct SnapshotArgs {
    #[command(subcommand)]
    pub command: SnapshotCommand,
}

/// Snapshot subcommands.
#[derive(Subcommand, Debug)]
pub enum SnapshotCommand {
    /// Inspect a snapshot file.
    Inspect {
        /// Snapshot path.
        path: PathBuf,
    },
}

/// Run the snapshot command.
pub fn run_snapshot(args: SnapshotArgs) -> Result<()> {
    match args.command {
        SnapshotCommand::Inspect { path } => inspect_snapshot(path),
    }
}

fn inspect_snapshot(path: PathBuf) -> Result<()> {
    let store = SnapshotStore::new(path.clone());
    let Some(snapshot) = store.load()? else {
        anyhow::bail!("Snapshot not found: {:?}", path);
    };

    println!("Snapshot: {:?}", path);
    println!(
        "  ticket range: [{}, {})",
        snapshot.min_value, snapshot.max_value
    );
    println!("  allocator cursor: {}", snapshot.cursor);
    println!("  rented: {}", snapshot.rented.len());
    println!("  frozen: {}", snapshot.frozen.len());
    println!("  pooled: {}", snapshot.pool.len());

    if let Some(head) = snapshot.rented.first() {
        println!(
            "  next renewal deadline: ticket {} in {}ms",
            head.ticket, head.remaining_ms
        );
    }
    if let Some(head) = snapshot.frozen.first() {
        println!(
            "  next release: ticket {} in {}ms",
            head.ticket, head.remaining_ms
        );
    }

    Ok(())
}
