//! Lease worker: the single-task command processor.
//!
//! One tokio task owns the free pool and the busy registry; no other code
//! touches that state, so no locking is needed. External callers hold a
//! cloneable [`LeaseHandle`] and submit commands over an mpsc channel; a
//! command that expects an answer carries a oneshot reply sender, so the
//! call is synchronous for the caller while the worker never blocks on a
//! caller.
//!
//! The event loop is a `select!` over the command channel, the shutdown
//! watch, and two timers, one per deadline chain. Each timer tracks only
//! its chain's head: transitions append at the tail with a constant
//! offset, so the head is always the next deadline due and every timer
//! decision is O(1). Exactly one event is handled per iteration, which
//! serializes every state transition, including the ones raced by renew
//! vs. expiry and return vs. expiry.
//!
//! After shutdown the command receiver is dropped; handle calls then fail
//! fast with [`LeaseError::WorkerClosed`] instead of blocking forever.

use super::pool::FreePool;
use super::registry::{BusyRegistry, ReletOutcome};
use super::settings::LeaseSettings;
use super::snapshot::{LeaseSnapshot, SnapshotTicket};
use crate::core::error::{LeaseError, LeaseResult};
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{self, Instant, Sleep};

/// Sentinel for "no ticket available" on the worker's internal reply.
/// This is why `min_value` must be greater than zero.
pub const NO_TICKET: u32 = 0;

/// Command channel depth. Callers queue here only while the worker is
/// mid-iteration; each command is answered before the next is taken.
const COMMAND_BUFFER: usize = 64;

/// Commands accepted by the worker.
enum Command {
    /// Issue a ticket; replies with the value or [`NO_TICKET`].
    Rent { reply: oneshot::Sender<u32> },
    /// Renew a rented ticket; replies false when it is not rented.
    Relet {
        ticket: u32,
        reply: oneshot::Sender<bool>,
    },
    /// Return a ticket. Fire-and-forget and idempotent.
    Return { ticket: u32 },
    /// Report chain and pool sizes.
    Stats { reply: oneshot::Sender<LeaseStats> },
    /// Capture a snapshot of the full lease state.
    Snapshot {
        reply: oneshot::Sender<LeaseSnapshot>,
    },
}

/// Sizes of the worker's data structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaseStats {
    /// Tickets in the rented chain.
    pub rented: usize,
    /// Tickets in the frozen chain.
    pub frozen: usize,
    /// Tickets queued in the free pool.
    pub pooled: usize,
    /// Total addressable tickets.
    pub capacity: u32,
}

impl LeaseStats {
    /// Busy tickets (rented + frozen).
    pub fn busy(&self) -> usize {
        self.rented + self.frozen
    }
}

/// Client facade over the worker's command channel.
#[derive(Clone)]
pub struct LeaseHandle {
    tx: mpsc::Sender<Command>,
}

impl LeaseHandle {
    /// Rent a ticket.
    pub async fn rent(&self) -> LeaseResult<u32> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Rent { reply })
            .await
            .map_err(|_| LeaseError::WorkerClosed)?;
        let ticket = rx.await.map_err(|_| LeaseError::WorkerClosed)?;
        if ticket == NO_TICKET {
            Err(LeaseError::PoolExhausted)
        } else {
            Ok(ticket)
        }
    }

    /// Renew a rented ticket, pushing its deadline out by one TTL.
    pub async fn relet(&self, ticket: u32) -> LeaseResult<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Relet { ticket, reply })
            .await
            .map_err(|_| LeaseError::WorkerClosed)?;
        if rx.await.map_err(|_| LeaseError::WorkerClosed)? {
            Ok(())
        } else {
            Err(LeaseError::NotRented { ticket })
        }
    }

    /// Return a ticket. Succeeds as a no-op for unknown or already-frozen
    /// tickets; the ack means the return was enqueued.
    pub async fn return_ticket(&self, ticket: u32) -> LeaseResult<()> {
        self.tx
            .send(Command::Return { ticket })
            .await
            .map_err(|_| LeaseError::WorkerClosed)
    }

    /// Fetch current chain and pool sizes.
    pub async fn stats(&self) -> LeaseResult<LeaseStats> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Stats { reply })
            .await
            .map_err(|_| LeaseError::WorkerClosed)?;
        rx.await.map_err(|_| LeaseError::WorkerClosed)
    }

    /// Capture a snapshot of the worker state.
    pub async fn snapshot(&self) -> LeaseResult<LeaseSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Snapshot { reply })
            .await
            .map_err(|_| LeaseError::WorkerClosed)?;
        rx.await.map_err(|_| LeaseError::WorkerClosed)
    }
}

/// State owned exclusively by the worker task.
struct LeaseState {
    settings: LeaseSettings,
    pool: FreePool,
    registry: BusyRegistry,
}

impl LeaseState {
    fn new(settings: LeaseSettings) -> Self {
        let pool = FreePool::new(&settings);
        Self {
            settings,
            pool,
            registry: BusyRegistry::new(),
        }
    }

    /// Issue a ticket, refilling the pool first if it ran empty.
    ///
    /// Returns the ticket (or [`NO_TICKET`]) and whether the rented chain
    /// was empty, in which case the expire timer must be armed.
    fn rent(&mut self, now: Instant) -> (u32, bool) {
        if self.pool.is_empty() {
            self.pool.refill(&self.registry);
        }
        let Some(ticket) = self.pool.take() else {
            return (NO_TICKET, false);
        };
        let arm_expire = self
            .registry
            .insert_rented(ticket, now + self.settings.ttl);
        (ticket, arm_expire)
    }

    /// Release the frozen head after its cooldown.
    ///
    /// Returns the ticket and whether it was recycled into the pool.
    fn release_head(&mut self) -> Option<(u32, bool)> {
        let ticket = self.registry.pop_frozen_head()?;
        let recycled = self.pool.recycle(ticket);
        Some((ticket, recycled))
    }

    fn stats(&self) -> LeaseStats {
        LeaseStats {
            rented: self.registry.rented_len(),
            frozen: self.registry.frozen_len(),
            pooled: self.pool.len(),
            capacity: self.settings.capacity(),
        }
    }

    fn snapshot(&self, now: Instant) -> LeaseSnapshot {
        let remaining = |at: Instant| at.saturating_duration_since(now).as_millis() as u64;
        LeaseSnapshot {
            min_value: self.settings.min_value,
            max_value: self.settings.max_value,
            cursor: self.pool.cursor(),
            rented: self
                .registry
                .iter_rented()
                .map(|(ticket, at)| SnapshotTicket {
                    ticket,
                    remaining_ms: remaining(at),
                })
                .collect(),
            frozen: self
                .registry
                .iter_frozen()
                .map(|(ticket, at)| SnapshotTicket {
                    ticket,
                    remaining_ms: remaining(at),
                })
                .collect(),
            pool: self.pool.tickets().collect(),
        }
    }

    /// Rebuild state from a snapshot, re-anchoring deadlines on `now`.
    ///
    /// A snapshot taken under a different ticket range is ignored: the
    /// worker starts empty instead of importing values it cannot issue.
    fn restore(&mut self, snapshot: &LeaseSnapshot, now: Instant) -> bool {
        if snapshot.min_value != self.settings.min_value
            || snapshot.max_value != self.settings.max_value
        {
            tracing::warn!(
                snapshot_min = snapshot.min_value,
                snapshot_max = snapshot.max_value,
                min = self.settings.min_value,
                max = self.settings.max_value,
                "snapshot range mismatch; starting with empty lease state"
            );
            return false;
        }

        let in_range = |t: u32| (self.settings.min_value..self.settings.max_value).contains(&t);
        for entry in &snapshot.rented {
            if in_range(entry.ticket) && !self.registry.contains(entry.ticket) {
                self.registry
                    .insert_rented(entry.ticket, now + Duration::from_millis(entry.remaining_ms));
            }
        }
        for entry in &snapshot.frozen {
            if in_range(entry.ticket) && !self.registry.contains(entry.ticket) {
                self.registry
                    .insert_frozen(entry.ticket, now + Duration::from_millis(entry.remaining_ms));
            }
        }
        let pool: Vec<u32> = snapshot
            .pool
            .iter()
            .copied()
            .filter(|&t| in_range(t) && !self.registry.contains(t))
            .collect();
        self.pool.restore(snapshot.cursor, pool);
        true
    }
}

/// The lease worker. Construct with [`LeaseWorker::new`], optionally
/// [`restore`](LeaseWorker::restore) a snapshot, then spawn
/// [`run`](LeaseWorker::run).
pub struct LeaseWorker {
    rx: mpsc::Receiver<Command>,
    state: LeaseState,
}

impl LeaseWorker {
    /// Create a worker and its client handle.
    pub fn new(settings: LeaseSettings) -> (Self, LeaseHandle) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        (
            Self {
                rx,
                state: LeaseState::new(settings),
            },
            LeaseHandle { tx },
        )
    }

    /// Restore lease state from a snapshot. Must be called before `run`.
    ///
    /// Returns false when the snapshot was ignored (range mismatch).
    pub fn restore(&mut self, snapshot: &LeaseSnapshot) -> bool {
        self.state.restore(snapshot, Instant::now())
    }

    /// Run the event loop until the shutdown signal flips or every handle
    /// is dropped.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let ttl = self.state.settings.ttl;
        let ttf = self.state.settings.ttf;
        let state = &mut self.state;

        let expire = time::sleep(ttl);
        let release = time::sleep(ttf);
        tokio::pin!(expire);
        tokio::pin!(release);
        rearm(expire.as_mut(), state.registry.rented_head(), ttl);
        rearm(release.as_mut(), state.registry.frozen_head(), ttf);

        tracing::info!(
            min = state.settings.min_value,
            max = state.settings.max_value,
            ttl_ms = ttl.as_millis() as u64,
            ttf_ms = ttf.as_millis() as u64,
            "lease worker started"
        );

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }

                cmd = self.rx.recv() => {
                    let Some(cmd) = cmd else { break };
                    match cmd {
                        Command::Rent { reply } => {
                            let now = Instant::now();
                            let (ticket, arm_expire) = state.rent(now);
                            if arm_expire {
                                expire.as_mut().reset(now + ttl);
                            }
                            let _ = reply.send(ticket);
                        }
                        Command::Relet { ticket, reply } => {
                            let now = Instant::now();
                            let renewed = match state.registry.relet(ticket, now + ttl) {
                                ReletOutcome::NotRented => false,
                                ReletOutcome::Renewed { head_moved } => {
                                    if head_moved {
                                        rearm(expire.as_mut(), state.registry.rented_head(), ttl);
                                    }
                                    true
                                }
                            };
                            let _ = reply.send(renewed);
                        }
                        Command::Return { ticket } => {
                            freeze(state, ticket, expire.as_mut(), release.as_mut());
                        }
                        Command::Stats { reply } => {
                            let _ = reply.send(state.stats());
                        }
                        Command::Snapshot { reply } => {
                            let _ = reply.send(state.snapshot(Instant::now()));
                        }
                    }
                }

                _ = expire.as_mut() => {
                    match state.registry.rented_head() {
                        // Spurious fire after a race vacated the chain.
                        None => expire.as_mut().reset(Instant::now() + ttl),
                        Some((ticket, _)) => {
                            tracing::debug!(ticket, "renewal deadline passed; freezing ticket");
                            freeze(state, ticket, expire.as_mut(), release.as_mut());
                        }
                    }
                }

                _ = release.as_mut() => {
                    match state.release_head() {
                        None => release.as_mut().reset(Instant::now() + ttf),
                        Some((ticket, recycled)) => {
                            tracing::debug!(ticket, recycled, "cooldown elapsed; ticket released");
                            rearm(release.as_mut(), state.registry.frozen_head(), ttf);
                        }
                    }
                }
            }
        }

        tracing::info!("lease worker stopped");
        // Dropping the receiver here makes every in-flight and future
        // handle call fail with WorkerClosed rather than hang.
    }
}

/// Freeze a ticket and re-arm whichever timers its transition touched.
fn freeze(state: &mut LeaseState, ticket: u32, expire: Pin<&mut Sleep>, release: Pin<&mut Sleep>) {
    let now = Instant::now();
    let ttf = state.settings.ttf;
    let Some(transition) = state.registry.freeze(ticket, now + ttf) else {
        return; // unknown or already frozen: idempotent no-op
    };
    if transition.was_rented_head {
        rearm(expire, state.registry.rented_head(), state.settings.ttl);
    }
    if transition.frozen_was_empty {
        release.reset(now + ttf);
    }
}

/// Point a timer at the chain head's deadline, or at `now + default` when
/// the chain is empty.
fn rearm(sleep: Pin<&mut Sleep>, head: Option<(u32, Instant)>, default: Duration) {
    match head {
        Some((_, deadline)) => sleep.reset(deadline),
        None => sleep.reset(Instant::now() + default),
    }
}
