//! File-backed snapshot persistence.
//!
//! The snapshot store is the optional durability extension point: the
//! runtime loads a snapshot before the worker starts and writes one at
//! graceful shutdown. Snapshots are bincode-encoded. Without a stored
//! snapshot (or with persistence disabled) the worker starts with an
//! empty busy registry and a freshly allocated pool.

use crate::lease::snapshot::LeaseSnapshot;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Store for a single snapshot file.
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Create a store backed by the given file path.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored snapshot, if one exists.
    pub fn load(&self) -> Result<Option<LeaseSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&self.path)
            .with_context(|| format!("failed to read snapshot: {}", self.path.display()))?;
        let snapshot = bincode::deserialize(&bytes)
            .with_context(|| format!("failed to decode snapshot: {}", self.path.display()))?;
        Ok(Some(snapshot))
    }

    /// Write a snapshot, replacing any previous one.
    ///
    /// Writes to a temporary sibling and renames it into place so a crash
    /// mid-write never leaves a truncated snapshot behind.
    pub fn save(&self, snapshot: &LeaseSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create snapshot directory: {}", parent.display())
            })?;
        }
        let bytes = bincode::serialize(snapshot).context("failed to encode snapshot")?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, &bytes)
            .with_context(|| format!("failed to write snapshot: {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to move snapshot into place: {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lease::snapshot::SnapshotTicket;

    fn sample_snapshot() -> LeaseSnapshot {
        LeaseSnapshot {
            min_value: 2,
            max_value: 10,
            cursor: 6,
            rented: vec![SnapshotTicket {
                ticket: 2,
                remaining_ms: 1_500,
            }],
            frozen: vec![SnapshotTicket {
                ticket: 3,
                remaining_ms: 700,
            }],
            pool: vec![4, 5],
        }
    }

    #[test]
    fn load_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("lease.snapshot"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("nested").join("lease.snapshot"));

        store.save(&sample_snapshot()).unwrap();
        let loaded = store.load().unwrap().expect("snapshot present");
        assert_eq!(loaded.min_value, 2);
        assert_eq!(loaded.cursor, 6);
        assert_eq!(loaded.rented.len(), 1);
        assert_eq!(loaded.frozen[0].ticket, 3);
        assert_eq!(loaded.pool, vec![4, 5]);
    }

    #[test]
    fn save_replaces_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("lease.snapshot"));

        store.save(&sample_snapshot()).unwrap();
        let mut second = sample_snapshot();
        second.pool = vec![7];
        store.save(&second).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.pool, vec![7]);
    }

    #[test]
    fn corrupt_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lease.snapshot");
        std::fs::write(&path, b"not a snapshot").unwrap();
        let store = SnapshotStore::new(path);
        assert!(store.load().is_err());
    }
}
