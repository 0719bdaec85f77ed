//! tessera.Lease gRPC adapter.
//!
//! Serves the three lease RPCs over gRPC:
//! - `Rent` - issue a ticket, or RESOURCE_EXHAUSTED when none is free
//! - `Relet` - renew a rented ticket, or NOT_FOUND when it is not rented
//! - `Return` - return a ticket; always acknowledges
//!
//! Layout mirrors the wire stack:
//! - [`proto`] - hand-written prost message implementations
//! - [`service`] - RPC logic over the worker handle
//! - [`server`] - tonic server and request routing
//! - [`errors`] - lease error → gRPC status mapping

pub mod errors;
pub mod proto;
pub mod server;
pub mod service;

pub use server::LeaseGrpcServer;
pub use service::LeaseRpcService;
