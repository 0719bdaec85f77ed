//! Lease RPC service logic.
//!
//! The service owns a [`LeaseHandle`] and translates wire messages into
//! worker commands. Semantics mirror the worker exactly:
//! - Rent fails with PoolExhausted when no value is free
//! - Relet fails with NotRented for unknown or frozen tickets
//!   (a ticket of 0 was never issued, so it falls out the same way)
//! - Return always acknowledges, including as a no-op

use super::proto;
use crate::core::error::{LeaseError, LeaseResult};
use crate::lease::worker::{LeaseHandle, LeaseStats};
use std::sync::atomic::{AtomicU64, Ordering};

/// RPC service for the tessera.Lease interface.
pub struct LeaseRpcService {
    /// Command channel to the lease worker.
    handle: LeaseHandle,
    /// Statistics.
    stats: RpcStats,
}

/// RPC call counters.
struct RpcStats {
    rents: AtomicU64,
    exhaustions: AtomicU64,
    relets: AtomicU64,
    relet_rejections: AtomicU64,
    returns: AtomicU64,
}

impl RpcStats {
    fn new() -> Self {
        Self {
            rents: AtomicU64::new(0),
            exhaustions: AtomicU64::new(0),
            relets: AtomicU64::new(0),
            relet_rejections: AtomicU64::new(0),
            returns: AtomicU64::new(0),
        }
    }
}

impl LeaseRpcService {
    /// Create a new service over a worker handle.
    pub fn new(handle: LeaseHandle) -> Self {
        Self {
            handle,
            stats: RpcStats::new(),
        }
    }

    /// Handle Rent.
    pub async fn rent(&self, _req: proto::RentRequest) -> LeaseResult<proto::RentResponse> {
        match self.handle.rent().await {
            Ok(ticket) => {
                self.stats.rents.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(ticket, "ticket rented");
                Ok(proto::RentResponse { ticket })
            }
            Err(err) => {
                if matches!(err, LeaseError::PoolExhausted) {
                    self.stats.exhaustions.fetch_add(1, Ordering::Relaxed);
                }
                Err(err)
            }
        }
    }

    /// Handle Relet.
    pub async fn relet(&self, req: proto::ReletRequest) -> LeaseResult<proto::ReletResponse> {
        match self.handle.relet(req.ticket).await {
            Ok(()) => {
                self.stats.relets.fetch_add(1, Ordering::Relaxed);
                Ok(proto::ReletResponse {})
            }
            Err(err) => {
                if matches!(err, LeaseError::NotRented { .. }) {
                    self.stats.relet_rejections.fetch_add(1, Ordering::Relaxed);
                }
                Err(err)
            }
        }
    }

    /// Handle Return.
    pub async fn return_ticket(
        &self,
        req: proto::ReturnRequest,
    ) -> LeaseResult<proto::ReturnResponse> {
        self.handle.return_ticket(req.ticket).await?;
        self.stats.returns.fetch_add(1, Ordering::Relaxed);
        Ok(proto::ReturnResponse {})
    }

    /// Current worker statistics (for diagnostics).
    pub async fn lease_stats(&self) -> LeaseResult<LeaseStats> {
        self.handle.stats().await
    }

    /// Call counters.
    pub fn metrics(&self) -> RpcMetrics {
        RpcMetrics {
            rents_total: self.stats.rents.load(Ordering::Relaxed),
            exhaustions_total: self.stats.exhaustions.load(Ordering::Relaxed),
            relets_total: self.stats.relets.load(Ordering::Relaxed),
            relet_rejections_total: self.stats.relet_rejections.load(Ordering::Relaxed),
            returns_total: self.stats.returns.load(Ordering::Relaxed),
        }
    }
}

/// RPC service metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RpcMetrics {
    /// Successful rents.
    pub rents_total: u64,
    /// Rents that found the pool exhausted.
    pub exhaustions_total: u64,
    /// Successful relets.
    pub relets_total: u64,
    /// Relets rejected as not-rented.
    pub relet_rejections_total: u64,
    /// Acknowledged returns.
    pub returns_total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::LeaseConfig;
    use crate::lease::settings::LeaseSettings;
    use crate::lease::worker::LeaseWorker;
    use tokio::sync::watch;

    fn spawn_service(min: u32, max: u32) -> (LeaseRpcService, watch::Sender<bool>) {
        let settings = LeaseSettings::resolve(&LeaseConfig {
            pool_volume: 0,
            ttl_ms: 60_000,
            ttf_ms: 60_000,
            min_value: min,
            max_value: max,
        })
        .expect("settings");
        let (worker, handle) = LeaseWorker::new(settings);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(worker.run(shutdown_rx));
        (LeaseRpcService::new(handle), shutdown_tx)
    }

    #[tokio::test(start_paused = true)]
    async fn rent_returns_ticket_in_range() {
        let (service, _shutdown) = spawn_service(100, 200);
        let resp = service.rent(proto::RentRequest {}).await.expect("rent");
        assert!((100..200).contains(&resp.ticket));
        assert_eq!(service.metrics().rents_total, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rent_exhaustion_is_counted() {
        let (service, _shutdown) = spawn_service(2, 3);
        service.rent(proto::RentRequest {}).await.expect("rent");
        let err = service.rent(proto::RentRequest {}).await.unwrap_err();
        assert!(matches!(err, LeaseError::PoolExhausted));
        assert_eq!(service.metrics().exhaustions_total, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn relet_unknown_ticket_is_rejected() {
        let (service, _shutdown) = spawn_service(2, 5);
        let err = service
            .relet(proto::ReletRequest { ticket: 1 })
            .await
            .unwrap_err();
        assert!(matches!(err, LeaseError::NotRented { ticket: 1 }));
        assert_eq!(service.metrics().relet_rejections_total, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn relet_rented_ticket_succeeds() {
        let (service, _shutdown) = spawn_service(2, 5);
        let ticket = service.rent(proto::RentRequest {}).await.unwrap().ticket;
        service
            .relet(proto::ReletRequest { ticket })
            .await
            .expect("relet");
        assert_eq!(service.metrics().relets_total, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn return_acks_even_for_unknown_ticket() {
        let (service, _shutdown) = spawn_service(2, 5);
        service
            .return_ticket(proto::ReturnRequest { ticket: 999 })
            .await
            .expect("return");
        assert_eq!(service.metrics().returns_total, 1);
    }
}
