//! Free-ticket pool and lazy allocator.
//!
//! The pool is a FIFO of ticket values eligible for issuance. It is
//! materialized on demand: when a rent finds the pool empty, an allocation
//! pass generates up to `pool_volume` previously-unused values starting
//! from a rotating cursor, wrapping from `max_value` back to `min_value`.
//! Values currently held in the busy registry are skipped without being
//! counted toward the pass size, so freshly generated values never collide
//! with a busy ticket.

use super::registry::BusyRegistry;
use super::settings::LeaseSettings;
use std::collections::VecDeque;

/// FIFO of tickets immediately available for issuance.
pub struct FreePool {
    /// Queued free tickets, issued front to back.
    queue: VecDeque<u32>,
    /// Next candidate value for the allocator.
    cursor: u32,
    min_value: u32,
    max_value: u32,
    volume: u32,
    /// Recycle cap; releases beyond this length are dropped.
    cap: usize,
}

impl FreePool {
    /// Create an empty pool for the given settings.
    pub fn new(settings: &LeaseSettings) -> Self {
        Self {
            queue: VecDeque::new(),
            cursor: settings.min_value,
            min_value: settings.min_value,
            max_value: settings.max_value,
            volume: settings.pool_volume,
            cap: settings.pool_cap(),
        }
    }

    /// Number of queued tickets.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the pool has no tickets queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Current allocator cursor.
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    /// Run one allocation pass.
    ///
    /// No-op when the registry already holds the full capacity. Otherwise
    /// the pool is rebuilt with `min(volume, capacity - busy)` values from
    /// the cursor; only invoked when the pool ran empty, so the rebuild
    /// discards nothing live.
    pub fn refill(&mut self, registry: &BusyRegistry) {
        let capacity = self.max_value - self.min_value;
        let busy = registry.len() as u32;
        if busy >= capacity {
            return;
        }
        let size = (capacity - busy).min(self.volume);

        self.queue.clear();
        for _ in 0..size {
            // Skip values still reserved; busy < capacity guarantees the
            // scan terminates within one trip around the range.
            while registry.contains(self.cursor) {
                self.advance_cursor();
            }
            self.queue.push_back(self.cursor);
            self.advance_cursor();
        }
    }

    fn advance_cursor(&mut self) {
        self.cursor += 1;
        if self.cursor >= self.max_value {
            self.cursor = self.min_value;
        }
    }

    /// Dequeue the next free ticket.
    pub fn take(&mut self) -> Option<u32> {
        self.queue.pop_front()
    }

    /// Recycle a released ticket to the pool tail.
    ///
    /// Returns false when the pool is over its cap; the ticket is then
    /// dropped from the pool but stays allocatable, since it is no longer
    /// in the busy registry and the cursor will revisit it.
    pub fn recycle(&mut self, ticket: u32) -> bool {
        if self.queue.len() > self.cap {
            return false;
        }
        self.queue.push_back(ticket);
        true
    }

    /// Queued tickets in issuance order (for snapshots).
    pub fn tickets(&self) -> impl Iterator<Item = u32> + '_ {
        self.queue.iter().copied()
    }

    /// Rebuild pool contents from a snapshot.
    pub fn restore(&mut self, cursor: u32, tickets: impl IntoIterator<Item = u32>) {
        self.cursor = if (self.min_value..self.max_value).contains(&cursor) {
            cursor
        } else {
            self.min_value
        };
        self.queue.clear();
        self.queue.extend(tickets);
    }
}
