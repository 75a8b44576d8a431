// ── Controller facade ──
//
// Composes the fleet registry, the command dispatcher and log monitors
// around one `FleetApi` backend, and owns the background refresh task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use lorasim_api::{SimulatorClient, TransportConfig};

use crate::api::FleetApi;
use crate::command::{CommandResult, Confirm, DeleteOutcome, FleetCommand, GateState};
use crate::config::ControllerConfig;
use crate::dispatcher::Dispatcher;
use crate::error::CoreError;
use crate::model::{DeviceRecord, EntityId, FleetRecord, FleetSummary, GatewayRecord};
use crate::monitor::LogMonitor;
use crate::selection::Selection;
use crate::store::DataStore;
use crate::stream::EntityStream;

// ── Controller ───────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Manages the initial
/// registry load, periodic background refresh, command dispatch and
/// log sessions.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: ControllerConfig,
    store: Arc<DataStore>,
    api: Arc<dyn FleetApi>,
    dispatcher: Dispatcher,
    cancel: CancellationToken,
    /// Child token for the current connection. Cancelled on disconnect,
    /// replaced on reconnect.
    cancel_child: Mutex<CancellationToken>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Controller {
    /// Create a Controller talking to the simulator at `config.url`.
    /// Does NOT fetch anything -- call [`connect()`](Self::connect).
    pub fn new(config: ControllerConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            timeout: config.timeout,
            accept_invalid_certs: config.accept_invalid_certs,
        };
        let client = SimulatorClient::new(config.url.clone(), &transport)?;
        Ok(Self::with_api(config, Arc::new(client)))
    }

    /// Create a Controller over any [`FleetApi`] implementation.
    pub fn with_api(config: ControllerConfig, api: Arc<dyn FleetApi>) -> Self {
        let store = Arc::new(DataStore::new());
        let dispatcher = Dispatcher::new(Arc::clone(&store), Arc::clone(&api));
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Self {
            inner: Arc::new(ControllerInner {
                config,
                store,
                api,
                dispatcher,
                cancel,
                cancel_child: Mutex::new(cancel_child),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Access the controller configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    /// Access the underlying fleet registry.
    pub fn store(&self) -> &Arc<DataStore> {
        &self.inner.store
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Load the registry and, if configured, start the periodic refresh.
    pub async fn connect(&self) -> Result<(), CoreError> {
        self.refresh().await?;

        let interval_secs = self.inner.config.refresh_interval_secs;
        if interval_secs > 0 {
            // A reconnect retires the previous refresh loop before starting
            // its own, so at most one loop polls the remote.
            let child = self.inner.cancel.child_token();
            let mut slot = self.inner.cancel_child.lock().await;
            slot.cancel();
            *slot = child.clone();
            drop(slot);

            let mut handles = self.inner.task_handles.lock().await;
            for handle in handles.drain(..) {
                let _ = handle.await;
            }
            handles.push(tokio::spawn(refresh_task(
                self.clone(),
                interval_secs,
                child,
            )));
        }

        info!(
            url = %self.inner.config.url,
            devices = self.inner.store.device_count(),
            gateways = self.inner.store.gateway_count(),
            "connected to simulator"
        );
        Ok(())
    }

    /// Stop background tasks. The registry keeps its last contents.
    pub async fn disconnect(&self) {
        // Cancel the child token (not the parent) so a later connect works.
        self.inner.cancel_child.lock().await.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        debug!("disconnected");
    }

    /// Replace the registry with the remote's current listing.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        self.inner.dispatcher.refresh().await
    }

    // ── Commands ─────────────────────────────────────────────────

    pub fn gates(&self, selection: &Selection) -> GateState {
        self.inner.dispatcher.gates(selection)
    }

    pub async fn execute(
        &self,
        command: FleetCommand,
        selection: &Selection,
    ) -> Result<CommandResult, CoreError> {
        self.inner.dispatcher.execute(command, selection).await
    }

    pub async fn delete_records<C>(
        &self,
        selection: &Selection,
        confirm: &C,
    ) -> Result<DeleteOutcome, CoreError>
    where
        C: Confirm + Sync + ?Sized,
    {
        self.inner.dispatcher.delete_records(selection, confirm).await
    }

    // ── Log sessions ─────────────────────────────────────────────

    /// A new, idle log monitor polling at the configured period.
    pub fn log_monitor(&self) -> LogMonitor {
        LogMonitor::new(
            Arc::clone(&self.inner.api),
            self.inner.config.log_poll_interval,
        )
    }

    // ── State observation ────────────────────────────────────────

    /// Every record, devices first, each group in remote order.
    pub fn list(&self) -> Vec<FleetRecord> {
        self.inner.store.list()
    }

    pub fn devices_snapshot(&self) -> Arc<Vec<Arc<DeviceRecord>>> {
        self.inner.store.devices_snapshot()
    }

    pub fn gateways_snapshot(&self) -> Arc<Vec<Arc<GatewayRecord>>> {
        self.inner.store.gateways_snapshot()
    }

    /// Look up one device by id.
    pub fn device(&self, id: &EntityId) -> Result<Arc<DeviceRecord>, CoreError> {
        self.inner
            .store
            .device(id)
            .ok_or_else(|| not_found("device", id))
    }

    /// Look up one gateway by id.
    pub fn gateway(&self, id: &EntityId) -> Result<Arc<GatewayRecord>, CoreError> {
        self.inner
            .store
            .gateway(id)
            .ok_or_else(|| not_found("gateway", id))
    }

    pub fn devices(&self) -> EntityStream<DeviceRecord> {
        self.inner.store.subscribe_devices()
    }

    pub fn gateways(&self) -> EntityStream<GatewayRecord> {
        self.inner.store.subscribe_gateways()
    }

    /// Fires whenever the registry changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.store.subscribe()
    }

    /// Dashboard counters computed from the registry.
    pub fn summary(&self) -> FleetSummary {
        self.inner.store.summary()
    }

    /// Dashboard counters as reported by the simulator.
    pub async fn fleet_summary(&self) -> Result<FleetSummary, CoreError> {
        Ok(self.inner.api.fleet_summary().await?)
    }
}

fn not_found(entity_type: &str, id: &EntityId) -> CoreError {
    CoreError::NotFound {
        entity_type: entity_type.into(),
        identifier: id.to_string(),
    }
}

/// Periodically refresh the registry from the simulator.
async fn refresh_task(controller: Controller, interval_secs: u64, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = controller.refresh().await {
                    warn!(error = %e, "periodic refresh failed");
                }
            }
        }
    }
}
