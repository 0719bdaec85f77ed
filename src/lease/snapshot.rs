//! Serializable worker snapshots.
//!
//! A snapshot captures everything the worker needs to resume: both deadline
//! chains in order, the free pool, and the allocator cursor. Deadlines are
//! stored as remaining milliseconds relative to capture time; restore
//! re-anchors them on the current clock. Because TTL and TTF are constants,
//! preserving chain order preserves the ascending-deadline invariant.

use serde::{Deserialize, Serialize};

/// One busy ticket in a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotTicket {
    /// Ticket value.
    pub ticket: u32,
    /// Milliseconds until the renewal deadline (rented) or release time
    /// (frozen), measured at capture.
    pub remaining_ms: u64,
}

/// Point-in-time capture of the lease worker state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaseSnapshot {
    /// Inclusive lower bound of the ticket range at capture.
    pub min_value: u32,
    /// Exclusive upper bound of the ticket range at capture.
    pub max_value: u32,
    /// Allocator cursor.
    pub cursor: u32,
    /// Rented chain, head to tail.
    pub rented: Vec<SnapshotTicket>,
    /// Frozen chain, head to tail.
    pub frozen: Vec<SnapshotTicket>,
    /// Free pool, front to back.
    pub pool: Vec<u32>,
}

impl LeaseSnapshot {
    /// Number of busy tickets captured.
    pub fn busy_len(&self) -> usize {
        self.rented.len() + self.frozen.len()
    }

    /// Whether the snapshot carries no lease state at all.
    pub fn is_empty(&self) -> bool {
        self.rented.is_empty() && self.frozen.is_empty() && self.pool.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_len_counts_both_chains() {
        let snapshot = LeaseSnapshot {
            min_value: 10,
            max_value: 20,
            cursor: 12,
            rented: vec![SnapshotTicket {
                ticket: 10,
                remaining_ms: 500,
            }],
            frozen: vec![
                SnapshotTicket {
                    ticket: 11,
                    remaining_ms: 100,
                },
                SnapshotTicket {
                    ticket: 12,
                    remaining_ms: 200,
                },
            ],
            pool: vec![13],
        };
        assert_eq!(snapshot.busy_len(), 3);
        assert!(!snapshot.is_empty());
    }
}
