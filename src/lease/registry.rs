//! Busy-ticket registry and deadline chains.
//!
//! Every reserved ticket (rented or frozen) owns one arena slot. Slots are
//! addressed by stable `u32` indices; a ticket-value map gives O(1) lookup
//! and two intrusive doubly-linked chains partition the slots into the
//! rented chain and the frozen chain, with `prev`/`next` stored as indices
//! rather than pointers.
//!
//! Both chains stay in strict ascending-deadline order without ever
//! sorting: TTL and TTF are constants, and every transition appends at the
//! tail with `now + constant`. The node whose deadline is due is therefore
//! always the chain head, which is what makes the timer handling O(1).

use std::collections::HashMap;
use tokio::time::Instant;

/// Sentinel index for "no slot".
const NIL: u32 = u32::MAX;

/// State of a busy ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketState {
    /// Actively leased; `expires_at` is the renewal deadline.
    Rented,
    /// Returned or expired; `expires_at` is the release time.
    Frozen,
}

/// Outcome of a relet attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReletOutcome {
    /// Ticket unknown or already frozen; nothing was mutated.
    NotRented,
    /// Deadline reset and node re-appended at the rented tail.
    Renewed {
        /// The node had been the rented head: the expire timer must be
        /// re-armed to the (possibly new) head's deadline.
        head_moved: bool,
    },
}

/// Chain effects of a rented → frozen transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreezeTransition {
    /// The node had been the rented head; re-arm the expire timer.
    pub was_rented_head: bool,
    /// The frozen chain was empty; arm the release timer.
    pub frozen_was_empty: bool,
}

struct Slot {
    ticket: u32,
    frozen: bool,
    expires_at: Instant,
    prev: u32,
    next: u32,
}

#[derive(Clone, Copy)]
struct Chain {
    head: u32,
    tail: u32,
    len: usize,
}

impl Chain {
    const fn new() -> Self {
        Self {
            head: NIL,
            tail: NIL,
            len: 0,
        }
    }
}

/// Registry of all currently reserved tickets.
pub struct BusyRegistry {
    slots: Vec<Slot>,
    /// Recycled slot indices.
    free_slots: Vec<u32>,
    /// Ticket value → slot index.
    index: HashMap<u32, u32>,
    rented: Chain,
    frozen: Chain,
}

impl BusyRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_slots: Vec::new(),
            index: HashMap::new(),
            rented: Chain::new(),
            frozen: Chain::new(),
        }
    }

    /// Number of busy tickets (rented + frozen).
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether no ticket is busy.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of rented tickets.
    pub fn rented_len(&self) -> usize {
        self.rented.len
    }

    /// Number of frozen tickets.
    pub fn frozen_len(&self) -> usize {
        self.frozen.len
    }

    /// Whether the ticket is currently reserved.
    pub fn contains(&self, ticket: u32) -> bool {
        self.index.contains_key(&ticket)
    }

    /// Current state of a busy ticket.
    pub fn state(&self, ticket: u32) -> Option<TicketState> {
        let idx = *self.index.get(&ticket)?;
        Some(if self.slots[idx as usize].frozen {
            TicketState::Frozen
        } else {
            TicketState::Rented
        })
    }

    /// Deadline of a busy ticket (renewal deadline or release time).
    pub fn deadline(&self, ticket: u32) -> Option<Instant> {
        let idx = *self.index.get(&ticket)?;
        Some(self.slots[idx as usize].expires_at)
    }

    /// Head of the rented chain: the next renewal deadline due.
    pub fn rented_head(&self) -> Option<(u32, Instant)> {
        self.chain_head(&self.rented)
    }

    /// Head of the frozen chain: the next release due.
    pub fn frozen_head(&self) -> Option<(u32, Instant)> {
        self.chain_head(&self.frozen)
    }

    fn chain_head(&self, chain: &Chain) -> Option<(u32, Instant)> {
        if chain.head == NIL {
            return None;
        }
        let slot = &self.slots[chain.head as usize];
        Some((slot.ticket, slot.expires_at))
    }

    /// Register a freshly rented ticket at the rented-chain tail.
    ///
    /// Returns true when the rented chain was empty, in which case the
    /// caller must arm the expire timer. The ticket must not already be
    /// busy.
    pub fn insert_rented(&mut self, ticket: u32, expires_at: Instant) -> bool {
        debug_assert!(!self.index.contains_key(&ticket));
        let was_empty = self.rented.len == 0;
        let idx = self.alloc_slot(ticket, false, expires_at);
        self.index.insert(ticket, idx);
        Self::push_tail(&mut self.slots, &mut self.rented, idx);
        was_empty
    }

    /// Register a frozen ticket at the frozen-chain tail (snapshot restore).
    ///
    /// Returns true when the frozen chain was empty.
    pub fn insert_frozen(&mut self, ticket: u32, releases_at: Instant) -> bool {
        debug_assert!(!self.index.contains_key(&ticket));
        let was_empty = self.frozen.len == 0;
        let idx = self.alloc_slot(ticket, true, releases_at);
        self.index.insert(ticket, idx);
        Self::push_tail(&mut self.slots, &mut self.frozen, idx);
        was_empty
    }

    /// Renew a rented ticket: reset its deadline and move it to the
    /// rented-chain tail. O(1); no chain scan.
    pub fn relet(&mut self, ticket: u32, expires_at: Instant) -> ReletOutcome {
        let Some(&idx) = self.index.get(&ticket) else {
            return ReletOutcome::NotRented;
        };
        if self.slots[idx as usize].frozen {
            return ReletOutcome::NotRented;
        }

        let head_moved = self.rented.head == idx;
        Self::unlink(&mut self.slots, &mut self.rented, idx);
        self.slots[idx as usize].expires_at = expires_at;
        Self::push_tail(&mut self.slots, &mut self.rented, idx);
        ReletOutcome::Renewed { head_moved }
    }

    /// Move a rented ticket to the frozen chain.
    ///
    /// Idempotent: returns None (no mutation) when the ticket is unknown
    /// or already frozen.
    pub fn freeze(&mut self, ticket: u32, releases_at: Instant) -> Option<FreezeTransition> {
        let &idx = self.index.get(&ticket)?;
        if self.slots[idx as usize].frozen {
            return None;
        }

        let transition = FreezeTransition {
            was_rented_head: self.rented.head == idx,
            frozen_was_empty: self.frozen.len == 0,
        };

        Self::unlink(&mut self.slots, &mut self.rented, idx);
        let slot = &mut self.slots[idx as usize];
        slot.frozen = true;
        slot.expires_at = releases_at;
        Self::push_tail(&mut self.slots, &mut self.frozen, idx);
        Some(transition)
    }

    /// Remove the frozen-chain head from the registry entirely.
    ///
    /// Returns the released ticket value; the caller decides whether it is
    /// recycled into the free pool.
    pub fn pop_frozen_head(&mut self) -> Option<u32> {
        let idx = self.frozen.head;
        if idx == NIL {
            return None;
        }
        Self::unlink(&mut self.slots, &mut self.frozen, idx);
        let ticket = self.slots[idx as usize].ticket;
        self.index.remove(&ticket);
        self.free_slots.push(idx);
        Some(ticket)
    }

    /// Rented tickets in chain (ascending-deadline) order.
    pub fn iter_rented(&self) -> ChainIter<'_> {
        ChainIter {
            slots: &self.slots,
            cursor: self.rented.head,
        }
    }

    /// Frozen tickets in chain (ascending-release) order.
    pub fn iter_frozen(&self) -> ChainIter<'_> {
        ChainIter {
            slots: &self.slots,
            cursor: self.frozen.head,
        }
    }

    fn alloc_slot(&mut self, ticket: u32, frozen: bool, expires_at: Instant) -> u32 {
        let slot = Slot {
            ticket,
            frozen,
            expires_at,
            prev: NIL,
            next: NIL,
        };
        match self.free_slots.pop() {
            Some(idx) => {
                self.slots[idx as usize] = slot;
                idx
            }
            None => {
                self.slots.push(slot);
                (self.slots.len() - 1) as u32
            }
        }
    }

    fn unlink(slots: &mut [Slot], chain: &mut Chain, idx: u32) {
        let (prev, next) = {
            let slot = &slots[idx as usize];
            (slot.prev, slot.next)
        };
        if prev == NIL {
            chain.head = next;
        } else {
            slots[prev as usize].next = next;
        }
        if next == NIL {
            chain.tail = prev;
        } else {
            slots[next as usize].prev = prev;
        }
        let slot = &mut slots[idx as usize];
        slot.prev = NIL;
        slot.next = NIL;
        chain.len -= 1;
    }

    fn push_tail(slots: &mut [Slot], chain: &mut Chain, idx: u32) {
        let tail = chain.tail;
        {
            let slot = &mut slots[idx as usize];
            slot.prev = tail;
            slot.next = NIL;
        }
        if tail == NIL {
            chain.head = idx;
        } else {
            slots[tail as usize].next = idx;
        }
        chain.tail = idx;
        chain.len += 1;
    }
}

impl Default for BusyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over one chain in head-to-tail order.
pub struct ChainIter<'a> {
    slots: &'a [Slot],
    cursor: u32,
}

impl Iterator for ChainIter<'_> {
    type Item = (u32, Instant);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NIL {
            return None;
        }
        let slot = &self.slots[self.cursor as usize];
        self.cursor = slot.next;
        Some((slot.ticket, slot.expires_at))
    }
}
