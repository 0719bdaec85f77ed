//! Main runtime orchestration.
//!
//! The runtime coordinates component lifecycle:
//! - Start order: storage → lease worker → listeners
//! - Shutdown order: snapshot capture → listeners → lease worker → storage
//!
//! The worker is constructed explicitly here and its handle passed to the
//! transport layer; there is no ambient global instance.

use crate::core::config::Config;
use crate::lease::settings::LeaseSettings;
use crate::lease::worker::{LeaseHandle, LeaseWorker};
use crate::storage::snapshot_store::SnapshotStore;
use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// How long shutdown waits for a component task before giving up.
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Component health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentHealth {
    /// Component is starting.
    Starting,
    /// Component is healthy and operational.
    Healthy,
    /// Component has failed.
    Failed,
    /// Component is stopping.
    Stopping,
    /// Component has stopped.
    Stopped,
}

/// Health status aggregated from all components.
#[derive(Debug, Clone)]
pub struct RuntimeHealth {
    /// Snapshot storage health.
    pub storage: ComponentHealth,
    /// Lease worker health.
    pub worker: ComponentHealth,
    /// Listener health.
    pub listeners: ComponentHealth,
}

impl Default for RuntimeHealth {
    fn default() -> Self {
        Self {
            storage: ComponentHealth::Starting,
            worker: ComponentHealth::Starting,
            listeners: ComponentHealth::Starting,
        }
    }
}

impl RuntimeHealth {
    /// Check if the runtime is ready to serve requests.
    pub fn is_ready(&self) -> bool {
        matches!(
            (self.storage, self.worker, self.listeners),
            (
                ComponentHealth::Healthy,
                ComponentHealth::Healthy,
                ComponentHealth::Healthy
            )
        )
    }

    /// Check if the runtime is alive (not failed).
    pub fn is_alive(&self) -> bool {
        !matches!(
            (self.storage, self.worker, self.listeners),
            (ComponentHealth::Failed, _, _)
                | (_, ComponentHealth::Failed, _)
                | (_, _, ComponentHealth::Failed)
        )
    }
}

/// Tessera runtime holding all component handles.
pub struct Runtime {
    /// Configuration.
    config: Arc<Config>,

    /// Resolved lease settings.
    settings: LeaseSettings,

    /// Snapshot store (when persistence is enabled).
    snapshot_store: Option<SnapshotStore>,

    /// Client handle to the lease worker.
    lease_handle: Option<LeaseHandle>,

    /// Lease worker task handle.
    worker_handle: Option<JoinHandle<()>>,

    /// Runtime health status.
    health: RuntimeHealth,

    /// Whether the runtime is running.
    running: Arc<AtomicBool>,

    /// Shutdown signal sender.
    shutdown_tx: watch::Sender<bool>,

    /// Shutdown signal receiver.
    shutdown_rx: watch::Receiver<bool>,

    /// gRPC server task handle.
    #[cfg(feature = "grpc")]
    grpc_handle: Option<JoinHandle<crate::core::error::LeaseResult<()>>>,
}

impl Runtime {
    /// Create a new runtime with the given configuration.
    pub fn new(config: Config) -> Result<Self> {
        config.validate().context("invalid configuration")?;
        let settings = config.lease_settings()?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            config: Arc::new(config),
            settings,
            snapshot_store: None,
            lease_handle: None,
            worker_handle: None,
            health: RuntimeHealth::default(),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            shutdown_rx,
            #[cfg(feature = "grpc")]
            grpc_handle: None,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the resolved lease settings.
    pub fn settings(&self) -> &LeaseSettings {
        &self.settings
    }

    /// Get the lease handle (once the worker has started).
    pub fn lease_handle(&self) -> Option<&LeaseHandle> {
        self.lease_handle.as_ref()
    }

    /// Get the current health status.
    pub fn health(&self) -> &RuntimeHealth {
        &self.health
    }

    /// Check if the runtime is ready to serve requests.
    pub fn is_ready(&self) -> bool {
        self.health.is_ready()
    }

    /// Check if the runtime is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Get a shutdown receiver for graceful shutdown coordination.
    pub fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    /// Initialize and start all runtime components.
    pub async fn start(&mut self) -> Result<()> {
        tracing::info!(
            min = self.settings.min_value,
            max = self.settings.max_value,
            "starting Tessera runtime"
        );

        self.init_storage()?;
        self.start_worker()?;
        self.start_listeners()?;

        self.running.store(true, Ordering::Release);
        tracing::info!("Tessera runtime started");

        Ok(())
    }

    /// Initialize the snapshot storage.
    fn init_storage(&mut self) -> Result<()> {
        if self.config.snapshot.enabled {
            let path = self.config.snapshot_path();
            tracing::info!(path = %path.display(), "snapshot persistence enabled");
            self.snapshot_store = Some(SnapshotStore::new(path));
        }
        self.health.storage = ComponentHealth::Healthy;
        Ok(())
    }

    /// Start the lease worker, restoring a snapshot when one is stored.
    fn start_worker(&mut self) -> Result<()> {
        let (mut worker, handle) = LeaseWorker::new(self.settings.clone());

        if let Some(ref store) = self.snapshot_store {
            match store.load() {
                Ok(Some(snapshot)) => {
                    let busy = snapshot.busy_len();
                    if worker.restore(&snapshot) {
                        tracing::info!(busy, "restored lease state from snapshot");
                    }
                }
                Ok(None) => {
                    tracing::debug!("no snapshot found; starting with empty lease state");
                }
                Err(e) => {
                    // A bad snapshot must not keep the service down.
                    tracing::warn!(error = %e, "failed to load snapshot; starting empty");
                }
            }
        }

        let shutdown_rx = self.shutdown_rx.clone();
        self.worker_handle = Some(tokio::spawn(worker.run(shutdown_rx)));
        self.lease_handle = Some(handle);
        self.health.worker = ComponentHealth::Healthy;

        tracing::info!("lease worker started");
        Ok(())
    }

    /// Start network listeners.
    fn start_listeners(&mut self) -> Result<()> {
        #[cfg(feature = "grpc")]
        {
            if let Some(ref grpc_config) = self.config.listeners.grpc {
                use crate::adapters::grpc::LeaseGrpcServer;

                let bind_addr: std::net::SocketAddr = grpc_config
                    .bind
                    .parse()
                    .context("invalid gRPC bind address")?;

                let handle = self
                    .lease_handle
                    .clone()
                    .context("lease worker must start before listeners")?;
                let shutdown_rx = self.shutdown_rx.clone();
                let server = LeaseGrpcServer::new(bind_addr, handle, shutdown_rx);

                self.grpc_handle = Some(tokio::spawn(async move { server.run().await }));
                tracing::info!(bind = %bind_addr, "gRPC listener started");
            }
        }

        self.health.listeners = ComponentHealth::Healthy;
        Ok(())
    }

    /// Trigger graceful shutdown.
    pub fn shutdown(&self) {
        tracing::info!("shutdown requested");
        let _ = self.shutdown_tx.send(true);
    }

    /// Run the runtime until SIGINT or an internal shutdown request.
    pub async fn run(&mut self) -> Result<()> {
        self.start().await?;

        let mut shutdown_rx = self.shutdown_rx.clone();
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!("shutdown signal received (SIGINT)");
            }
            _ = async {
                while !*shutdown_rx.borrow() {
                    if shutdown_rx.changed().await.is_err() {
                        break;
                    }
                }
            } => {
                tracing::info!("shutdown requested by component");
            }
        }

        self.stop().await?;
        Ok(())
    }

    /// Stop all runtime components.
    ///
    /// The snapshot is captured first, while the worker still answers;
    /// components then stop in reverse start order.
    pub async fn stop(&mut self) -> Result<()> {
        tracing::info!("stopping Tessera runtime");
        self.running.store(false, Ordering::Release);

        self.persist_snapshot().await;

        // Signal shutdown to all components.
        let _ = self.shutdown_tx.send(true);

        self.stop_listeners().await;
        self.stop_worker().await;
        self.health.storage = ComponentHealth::Stopped;

        tracing::info!("Tessera runtime stopped");
        Ok(())
    }

    /// Capture and persist a snapshot, when persistence is enabled.
    async fn persist_snapshot(&self) {
        let (Some(store), Some(handle)) = (&self.snapshot_store, &self.lease_handle) else {
            return;
        };
        match handle.snapshot().await {
            Ok(snapshot) => match store.save(&snapshot) {
                Ok(()) => {
                    tracing::info!(
                        busy = snapshot.busy_len(),
                        path = %store.path().display(),
                        "lease snapshot written"
                    );
                }
                Err(e) => tracing::warn!(error = %e, "failed to write snapshot"),
            },
            Err(e) => tracing::warn!(error = %e, "failed to capture snapshot"),
        }
    }

    /// Stop network listeners.
    async fn stop_listeners(&mut self) {
        self.health.listeners = ComponentHealth::Stopping;

        #[cfg(feature = "grpc")]
        {
            if let Some(handle) = self.grpc_handle.take() {
                match tokio::time::timeout(STOP_TIMEOUT, handle).await {
                    Ok(Ok(Ok(()))) => {
                        tracing::info!("gRPC server stopped");
                    }
                    Ok(Ok(Err(e))) => {
                        tracing::warn!(error = %e, "gRPC server stopped with error");
                    }
                    Ok(Err(e)) => {
                        tracing::warn!(error = %e, "gRPC server task panicked");
                    }
                    Err(_) => {
                        tracing::warn!("gRPC server stop timed out");
                    }
                }
            }
        }

        self.health.listeners = ComponentHealth::Stopped;
    }

    /// Stop the lease worker.
    async fn stop_worker(&mut self) {
        self.health.worker = ComponentHealth::Stopping;

        if let Some(handle) = self.worker_handle.take() {
            match tokio::time::timeout(STOP_TIMEOUT, handle).await {
                Ok(Ok(())) => {
                    tracing::info!("lease worker stopped");
                }
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "lease worker task panicked");
                }
                Err(_) => {
                    tracing::warn!("lease worker stop timed out");
                }
            }
        }

        self.health.worker = ComponentHealth::Stopped;
    }

    /// Start the runtime for tests (without listeners or signal handling).
    pub async fn start_for_tests(&mut self) -> Result<()> {
        self.init_storage()?;
        self.start_worker()?;
        self.running.store(true, Ordering::Release);
        Ok(())
    }

    /// Stop the runtime for tests.
    pub async fn shutdown_for_tests(&mut self) -> Result<()> {
        self.persist_snapshot().await;
        let _ = self.shutdown_tx.send(true);
        self.stop_worker().await;
        self.running.store(false, Ordering::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_defaults_to_starting() {
        let health = RuntimeHealth::default();
        assert!(!health.is_ready());
        assert!(health.is_alive());
    }

    #[test]
    fn ready_requires_all_components_healthy() {
        let mut health = RuntimeHealth {
            storage: ComponentHealth::Healthy,
            worker: ComponentHealth::Healthy,
            listeners: ComponentHealth::Healthy,
        };
        assert!(health.is_ready());

        health.worker = ComponentHealth::Stopping;
        assert!(!health.is_ready());
    }

    #[test]
    fn failed_component_marks_runtime_dead() {
        let health = RuntimeHealth {
            storage: ComponentHealth::Healthy,
            worker: ComponentHealth::Failed,
            listeners: ComponentHealth::Healthy,
        };
        assert!(!health.is_alive());
    }

    #[tokio::test]
    async fn runtime_starts_and_stops_worker() {
        let config = Config::from_toml("").unwrap();
        let mut runtime = Runtime::new(config).unwrap();

        runtime.start_for_tests().await.unwrap();
        assert!(runtime.is_running());

        let handle = runtime.lease_handle().unwrap().clone();
        let ticket = handle.rent().await.expect("rent");
        assert!(ticket >= 100_000);

        runtime.shutdown_for_tests().await.unwrap();
        assert!(!runtime.is_running());
        assert!(handle.rent().await.is_err());
    }

    #[test]
    fn rejects_invalid_configuration() {
        let config = Config {
            lease: crate::core::config::LeaseConfig {
                min_value: 9,
                max_value: 5,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(Runtime::new(config).is_err());
    }
}
