// ── Remote fleet API seam ──
//
// The dispatcher, registry refresh and log monitor talk to the simulator
// only through `FleetApi`, so they can run against `SimulatorClient` in
// production and against in-memory fakes in tests.

use async_trait::async_trait;
use tracing::debug;

use lorasim_api::SimulatorClient;

use crate::model::{ActivationState, DeviceRecord, EntityId, FleetSummary, GatewayRecord, UplinkState};

pub use lorasim_api::Error as ApiError;

/// Remote operations the core consumes.
#[async_trait]
pub trait FleetApi: Send + Sync {
    async fn list_devices(&self) -> Result<Vec<DeviceRecord>, ApiError>;

    async fn list_gateways(&self) -> Result<Vec<GatewayRecord>, ApiError>;

    /// Set the activation state of every listed device in one call.
    async fn set_activation(&self, ids: &[EntityId], state: ActivationState) -> Result<(), ApiError>;

    /// Set the uplink state of every listed device in one call.
    async fn set_uplink(&self, ids: &[EntityId], state: UplinkState) -> Result<(), ApiError>;

    /// Fetch a device's log lines. A `null` log list is returned as empty.
    async fn fetch_logs(&self, device_id: &EntityId) -> Result<Vec<String>, ApiError>;

    async fn delete_device(&self, id: &EntityId) -> Result<(), ApiError>;

    async fn delete_gateway(&self, id: &EntityId) -> Result<(), ApiError>;

    async fn fleet_summary(&self) -> Result<FleetSummary, ApiError>;
}

fn dev_euis(ids: &[EntityId]) -> Vec<String> {
    ids.iter().map(ToString::to_string).collect()
}

#[async_trait]
impl FleetApi for SimulatorClient {
    async fn list_devices(&self) -> Result<Vec<DeviceRecord>, ApiError> {
        let raw = SimulatorClient::list_devices(self).await?;
        Ok(raw.into_iter().map(DeviceRecord::from).collect())
    }

    async fn list_gateways(&self) -> Result<Vec<GatewayRecord>, ApiError> {
        let raw = SimulatorClient::list_gateways(self).await?;
        Ok(raw.into_iter().map(GatewayRecord::from).collect())
    }

    async fn set_activation(&self, ids: &[EntityId], state: ActivationState) -> Result<(), ApiError> {
        let batch = dev_euis(ids);
        debug!(count = batch.len(), %state, "setting activation");
        match state {
            ActivationState::Playing => self.start_devices(&batch).await,
            ActivationState::Paused => self.stop_devices(&batch).await,
        }
    }

    async fn set_uplink(&self, ids: &[EntityId], state: UplinkState) -> Result<(), ApiError> {
        let batch = dev_euis(ids);
        debug!(count = batch.len(), %state, "setting uplink");
        match state {
            UplinkState::Running => self.start_uplink(&batch).await,
            UplinkState::Stopped => self.stop_uplink(&batch).await,
        }
    }

    async fn fetch_logs(&self, device_id: &EntityId) -> Result<Vec<String>, ApiError> {
        let logs = self.device_logs(device_id.as_str()).await?;
        Ok(logs.logs.unwrap_or_default())
    }

    async fn delete_device(&self, id: &EntityId) -> Result<(), ApiError> {
        SimulatorClient::delete_device(self, id.as_str()).await
    }

    async fn delete_gateway(&self, id: &EntityId) -> Result<(), ApiError> {
        SimulatorClient::delete_gateway(self, id.as_str()).await
    }

    async fn fleet_summary(&self) -> Result<FleetSummary, ApiError> {
        Ok(self.dashboard_summary().await?.into())
    }
}
