//! Protocol adapters.
//!
//! Adapters translate external protocol semantics into lease-worker
//! commands. Every adapter talks to the worker through a
//! [`LeaseHandle`](crate::lease::worker::LeaseHandle); the worker itself
//! never knows which protocol a request arrived on.
//!
//! Currently implemented:
//! - [`grpc`] - tessera.Lease gRPC adapter (feature `grpc`)

#[cfg(feature = "grpc")]
pub mod grpc;
