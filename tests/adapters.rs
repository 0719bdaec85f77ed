//! Tests for the tessera.Lease gRPC adapter.
#![cfg(feature = "grpc")]

mod common;

use common::{assert_err, assert_ok, spawn_worker, test_settings};
use prost::Message;
use std::collections::HashSet;
use tessera::adapters::grpc::errors::to_status;
use tessera::adapters::grpc::{proto, LeaseGrpcServer, LeaseRpcService};
use tokio::sync::watch;
use tonic::Code;

fn spawn_service(min: u32, max: u32, ttl_ms: u64, ttf_ms: u64) -> (LeaseRpcService, watch::Sender<bool>) {
    let (handle, shutdown) = spawn_worker(test_settings(min, max, ttl_ms, ttf_ms));
    (LeaseRpcService::new(handle), shutdown)
}

// ============================================================================
// RPC semantics
// ============================================================================

#[tokio::test(start_paused = true)]
async fn rent_relet_return_happy_path() {
    let (service, _shutdown) = spawn_service(100, 110, 60_000, 60_000);

    let rented = assert_ok(service.rent(proto::RentRequest {}).await);
    assert!((100..110).contains(&rented.ticket));

    assert_ok(
        service
            .relet(proto::ReletRequest {
                ticket: rented.ticket,
            })
            .await,
    );
    assert_ok(
        service
            .return_ticket(proto::ReturnRequest {
                ticket: rented.ticket,
            })
            .await,
    );

    let metrics = service.metrics();
    assert_eq!(metrics.rents_total, 1);
    assert_eq!(metrics.relets_total, 1);
    assert_eq!(metrics.returns_total, 1);
}

#[tokio::test(start_paused = true)]
async fn rent_drains_to_resource_exhausted() {
    let (service, _shutdown) = spawn_service(2, 5, 60_000, 60_000);

    let mut seen = HashSet::new();
    for _ in 0..3 {
        let resp = assert_ok(service.rent(proto::RentRequest {}).await);
        assert!(seen.insert(resp.ticket));
    }

    let err = assert_err(service.rent(proto::RentRequest {}).await);
    assert_eq!(to_status(&err).code(), Code::ResourceExhausted);
    assert_eq!(service.metrics().exhaustions_total, 1);
}

#[tokio::test(start_paused = true)]
async fn relet_unknown_maps_to_not_found() {
    let (service, _shutdown) = spawn_service(2, 5, 60_000, 60_000);

    let err = assert_err(service.relet(proto::ReletRequest { ticket: 1 }).await);
    let status = to_status(&err);
    assert_eq!(status.code(), Code::NotFound);
    assert!(status.message().contains('1'));
}

#[tokio::test(start_paused = true)]
async fn relet_after_expiry_maps_to_not_found() {
    let (service, _shutdown) = spawn_service(2, 5, 1_000, 60_000);

    let ticket = assert_ok(service.rent(proto::RentRequest {}).await).ticket;
    tokio::time::sleep(std::time::Duration::from_millis(1_100)).await;

    let err = assert_err(service.relet(proto::ReletRequest { ticket }).await);
    assert_eq!(to_status(&err).code(), Code::NotFound);
}

#[tokio::test(start_paused = true)]
async fn return_is_always_acknowledged() {
    let (service, _shutdown) = spawn_service(2, 5, 60_000, 60_000);

    // Unknown ticket, rented ticket, and double return all succeed.
    assert_ok(service.return_ticket(proto::ReturnRequest { ticket: 4 }).await);
    let ticket = assert_ok(service.rent(proto::RentRequest {}).await).ticket;
    assert_ok(service.return_ticket(proto::ReturnRequest { ticket }).await);
    assert_ok(service.return_ticket(proto::ReturnRequest { ticket }).await);

    assert_eq!(service.metrics().returns_total, 3);
}

#[tokio::test(start_paused = true)]
async fn worker_shutdown_maps_to_unavailable() {
    let (worker, handle) = tessera::lease::worker::LeaseWorker::new(test_settings(2, 5, 60_000, 60_000));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(worker.run(shutdown_rx));
    let service = LeaseRpcService::new(handle);

    assert_ok(service.rent(proto::RentRequest {}).await);

    shutdown_tx.send(true).unwrap();
    task.await.unwrap();

    let err = assert_err(service.rent(proto::RentRequest {}).await);
    assert_eq!(to_status(&err).code(), Code::Unavailable);
}

// ============================================================================
// Wire format
// ============================================================================

#[test]
fn proto_round_trips() {
    let msg = proto::RentResponse { ticket: 100_042 };
    let bytes = msg.encode_to_vec();
    let decoded = proto::RentResponse::decode(bytes.as_slice()).unwrap();
    assert_eq!(decoded, msg);

    // Empty requests stay empty on the wire.
    assert_eq!(proto::RentRequest {}.encode_to_vec().len(), 0);
}

#[test]
fn proto_zero_ticket_is_elided() {
    let msg = proto::ReturnRequest { ticket: 0 };
    assert!(msg.encode_to_vec().is_empty());
}

// ============================================================================
// Server construction
// ============================================================================

#[tokio::test]
async fn server_exposes_bind_addr_and_service() {
    let (handle, _shutdown) = spawn_worker(test_settings(2, 5, 60_000, 60_000));
    let (_tx, rx) = watch::channel(false);
    let addr = "127.0.0.1:4180".parse().unwrap();

    let server = LeaseGrpcServer::new(addr, handle, rx);
    assert_eq!(server.bind_addr(), addr);

    let resp = assert_ok(server.service().rent(proto::RentRequest {}).await);
    assert!((2..5).contains(&resp.ticket));
}
