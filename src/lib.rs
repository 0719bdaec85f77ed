//! Tessera - ticket-lease issuance daemon.
//!
//! Tessera issues unique integer tickets ("leases") from a bounded numeric
//! range to competing clients, tracks their liveness, and reclaims tickets
//! automatically when clients stop renewing. A client rents a ticket, must
//! periodically relet it to keep it reserved, and either returns it
//! explicitly or lets it expire.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Client Protocols                         │
//! │                  tessera.Lease gRPC (tonic)                     │
//! └─────────────────────────────────────────────────────────────────┘
//!                                  │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Lease Worker                             │
//! │   mpsc commands + oneshot replies, one task owns all state      │
//! └─────────────────────────────────────────────────────────────────┘
//!                                  │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                Free Pool │ Busy Registry │ Timers               │
//! │   rotating allocator │ rented/frozen deadline chains │ TTL/TTF  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Module Organization
//!
//! ## Core
//! - [`core::config`] - Configuration parsing and validation
//! - [`core::runtime`] - Main runtime orchestration
//! - [`core::error`] - Error types and mapping
//!
//! ## Lease
//! - [`lease::settings`] - Option resolution
//! - [`lease::pool`] - Free-ticket pool and lazy allocator
//! - [`lease::registry`] - Busy registry and deadline chains
//! - [`lease::worker`] - Command processor and client handle
//! - [`lease::snapshot`] - Serializable worker snapshots
//!
//! ## Storage
//! - [`storage::snapshot_store`] - File-backed snapshot persistence
//!
//! ## Adapters
//! - `adapters::grpc` - tessera.Lease gRPC adapter (feature `grpc`)
//!
//! ## CLI
//! - [`cli::commands`] - CLI command implementations
//!
//! # Key Invariants
//!
//! - A ticket value lives in at most one of {free pool, busy registry}.
//! - Both deadline chains are kept in ascending order by construction:
//!   TTL and TTF are constants and every transition appends at the tail,
//!   so expiry work only ever inspects a chain head (O(1)).
//! - All state transitions are applied by a single worker task; requests
//!   and timer fires share one serialization point, so renew/expiry and
//!   return/expiry races resolve deterministically.
//! - A frozen ticket is not reissued before its cooldown elapses.

// Core infrastructure
pub mod core;

// Lease pool runtime
pub mod lease;

// Storage layer
pub mod storage;

// Protocol adapters
pub mod adapters;

// CLI
pub mod cli;

// Re-exports for convenience
pub use self::core::{config, error, runtime};
pub use lease::{pool, registry, settings, snapshot, worker};
pub use storage::snapshot_store;
