// Simulator API wire types
//
// Raw JSON shapes as served by the simulator backend. Status fields use
// `#[serde(default)]` because older backends omit them for devices that
// have never been started.

use serde::{Deserialize, Serialize};

// ── Envelopes ────────────────────────────────────────────────────────

/// List endpoints wrap their payload as `{ "response": [...] }`.
#[derive(Debug, Deserialize)]
pub struct ListResponse<T> {
    pub response: Vec<T>,
}

/// Error bodies carry either `message` or `error`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ErrorBody {
    pub(crate) fn into_message(self) -> Option<String> {
        self.message.or(self.error)
    }
}

/// Body of the batched start/stop endpoints.
#[derive(Debug, Serialize)]
pub struct DevEuiBatch<'a> {
    #[serde(rename = "devEUIs")]
    pub dev_euis: &'a [String],
}

// ── Device ───────────────────────────────────────────────────────────

/// A simulated end-device from `GET /devices`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimDevice {
    #[serde(rename = "devEUI")]
    pub dev_eui: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Gateway the device is attached to.
    #[serde(default)]
    pub gateway: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    /// `"playing"` or `"paused"`.
    #[serde(default, rename = "currentStatus")]
    pub current_status: Option<String>,
    /// `"running"` or `"stopped"`.
    #[serde(default, rename = "uplinkStatus")]
    pub uplink_status: Option<String>,
}

// ── Gateway ──────────────────────────────────────────────────────────

/// MongoDB-style object id: `{ "$oid": "..." }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectId {
    #[serde(rename = "$oid")]
    pub oid: String,
}

/// A gateway from `GET /gateways`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimGateway {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "macAddress")]
    pub mac_address: Option<String>,
    /// `true` for virtual (simulated) gateways.
    #[serde(default, rename = "typeGateway")]
    pub type_gateway: bool,
    #[serde(default)]
    pub no_of_devices: Option<u32>,
}

// ── Logs ─────────────────────────────────────────────────────────────

/// Body of `GET /devices/{devEUI}/logs`. `logs` may be `null`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceLogs {
    #[serde(default)]
    pub logs: Option<Vec<String>>,
}

// ── Dashboard ────────────────────────────────────────────────────────

/// Fleet counters from `GET /dashboard/summary`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardSummary {
    #[serde(default)]
    pub total_devices: u32,
    #[serde(default)]
    pub active_devices: u32,
    #[serde(default)]
    pub total_gateways: u32,
}
