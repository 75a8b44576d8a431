// ── In-memory FleetApi for unit tests ──

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::api::{ApiError, FleetApi};
use crate::model::{
    ActivationState, DevicePatch, DeviceRecord, EntityId, FleetSummary, GatewayRecord,
    UplinkState,
};

/// A recorded remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    ListDevices,
    ListGateways,
    SetActivation(Vec<EntityId>, ActivationState),
    SetUplink(Vec<EntityId>, UplinkState),
    DeleteDevice(EntityId),
    DeleteGateway(EntityId),
}

#[derive(Default)]
struct State {
    devices: Vec<DeviceRecord>,
    gateways: Vec<GatewayRecord>,
    calls: Vec<Call>,
    fail_commands: Option<u16>,
    fail_lists: Option<u16>,
    fail_deletes: HashSet<EntityId>,
    logs: HashMap<EntityId, Result<Vec<String>, u16>>,
    log_fetches: HashMap<EntityId, usize>,
    log_holds: HashMap<EntityId, Arc<Semaphore>>,
}

/// Simulator stand-in holding the "remote" fleet in memory.
#[derive(Default)]
pub(crate) struct FakeApi {
    state: Mutex<State>,
}

fn status(code: u16) -> ApiError {
    ApiError::Status {
        status: code,
        message: "simulated failure".into(),
    }
}

#[allow(clippy::unwrap_used)]
impl FakeApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_fleet(devices: Vec<DeviceRecord>, gateways: Vec<GatewayRecord>) -> Self {
        let api = Self::new();
        {
            let mut state = api.state.lock().unwrap();
            state.devices = devices;
            state.gateways = gateways;
        }
        api
    }

    pub(crate) fn fail_commands(&self, code: u16) {
        self.state.lock().unwrap().fail_commands = Some(code);
    }

    pub(crate) fn fail_lists(&self, code: u16) {
        self.state.lock().unwrap().fail_lists = Some(code);
    }

    pub(crate) fn fail_delete(&self, id: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_deletes
            .insert(EntityId::from(id));
    }

    /// Replace a device on the remote side only.
    pub(crate) fn set_remote_device(&self, device: DeviceRecord) {
        let mut state = self.state.lock().unwrap();
        if let Some(slot) = state.devices.iter_mut().find(|d| d.id == device.id) {
            *slot = device;
        }
    }

    pub(crate) fn set_logs(&self, id: &str, logs: Result<Vec<String>, u16>) {
        self.state
            .lock()
            .unwrap()
            .logs
            .insert(EntityId::from(id), logs);
    }

    /// Block log fetches for `id` until permits are added to the returned
    /// semaphore.
    pub(crate) fn hold_logs(&self, id: &str) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.state
            .lock()
            .unwrap()
            .log_holds
            .insert(EntityId::from(id), Arc::clone(&gate));
        gate
    }

    pub(crate) fn log_fetches(&self, id: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .log_fetches
            .get(&EntityId::from(id))
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Calls other than listings.
    pub(crate) fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::ListDevices | Call::ListGateways))
            .collect()
    }

    fn patch_remote(&self, call: Call, ids: &[EntityId], patch: DevicePatch) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if let Some(code) = state.fail_commands {
            return Err(status(code));
        }
        for device in state.devices.iter_mut().filter(|d| ids.contains(&d.id)) {
            *device = patch.apply(device);
        }
        Ok(())
    }
}

#[allow(clippy::unwrap_used)]
#[async_trait]
impl FleetApi for FakeApi {
    async fn list_devices(&self) -> Result<Vec<DeviceRecord>, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ListDevices);
        match state.fail_lists {
            Some(code) => Err(status(code)),
            None => Ok(state.devices.clone()),
        }
    }

    async fn list_gateways(&self) -> Result<Vec<GatewayRecord>, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ListGateways);
        match state.fail_lists {
            Some(code) => Err(status(code)),
            None => Ok(state.gateways.clone()),
        }
    }

    async fn set_activation(&self, ids: &[EntityId], state: ActivationState) -> Result<(), ApiError> {
        let patch = match state {
            ActivationState::Playing => DevicePatch::activation(state),
            ActivationState::Paused => DevicePatch {
                activation: Some(state),
                uplink: Some(UplinkState::Stopped),
            },
        };
        self.patch_remote(Call::SetActivation(ids.to_vec(), state), ids, patch)
    }

    async fn set_uplink(&self, ids: &[EntityId], state: UplinkState) -> Result<(), ApiError> {
        self.patch_remote(
            Call::SetUplink(ids.to_vec(), state),
            ids,
            DevicePatch::uplink(state),
        )
    }

    async fn fetch_logs(&self, device_id: &EntityId) -> Result<Vec<String>, ApiError> {
        let hold = {
            let mut state = self.state.lock().unwrap();
            *state.log_fetches.entry(device_id.clone()).or_default() += 1;
            state.log_holds.get(device_id).cloned()
        };
        if let Some(gate) = hold {
            let _permit = gate.acquire().await.unwrap();
        }
        let state = self.state.lock().unwrap();
        match state.logs.get(device_id) {
            Some(Ok(lines)) => Ok(lines.clone()),
            Some(Err(code)) => Err(status(*code)),
            None => Ok(Vec::new()),
        }
    }

    async fn delete_device(&self, id: &EntityId) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::DeleteDevice(id.clone()));
        if state.fail_deletes.contains(id) {
            return Err(status(500));
        }
        state.devices.retain(|d| &d.id != id);
        Ok(())
    }

    async fn delete_gateway(&self, id: &EntityId) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::DeleteGateway(id.clone()));
        if state.fail_deletes.contains(id) {
            return Err(status(404));
        }
        state.gateways.retain(|g| &g.id != id);
        Ok(())
    }

    async fn fleet_summary(&self) -> Result<FleetSummary, ApiError> {
        let state = self.state.lock().unwrap();
        let active = state.devices.iter().filter(|d| d.is_playing()).count();
        Ok(FleetSummary {
            total_devices: u32::try_from(state.devices.len()).unwrap(),
            active_devices: u32::try_from(active).unwrap(),
            total_gateways: u32::try_from(state.gateways.len()).unwrap(),
        })
    }
}

/// Device record builder for tests.
pub(crate) fn device(id: &str, activation: ActivationState, uplink: UplinkState) -> DeviceRecord {
    DeviceRecord {
        id: EntityId::from(id),
        name: format!("dev-{id}"),
        gateway_id: None,
        region: Some("EU868".into()),
        activation,
        uplink,
    }
}

pub(crate) fn gateway(id: &str) -> GatewayRecord {
    GatewayRecord {
        id: EntityId::from(id),
        name: format!("gw-{id}"),
        mac: None,
        is_virtual: true,
        device_count: 0,
    }
}
