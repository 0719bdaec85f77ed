//! Lease pool runtime.
//!
//! The lease pool issues unique integer tickets from a bounded range and
//! tracks them through the `Free → Rented → Frozen → Free` cycle. This
//! module contains:
//! - [`settings`] - Option resolution and validation
//! - [`pool`] - Free-ticket pool and lazy allocator
//! - [`registry`] - Busy-ticket registry and deadline chains
//! - [`worker`] - Single-task command processor and client handle
//! - [`snapshot`] - Serializable worker snapshots

pub mod pool;
pub mod registry;
pub mod settings;
pub mod snapshot;
pub mod worker;
