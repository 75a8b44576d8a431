// ── Domain model ──
//
// Canonical types shared by the registry, dispatcher and log monitor.
// Wire types from `lorasim-api` are converted into these in `convert`.

pub mod device;
pub mod entity_id;
pub mod gateway;
pub mod log;
pub mod summary;

use std::sync::Arc;

use serde::Serialize;

pub use device::{ActivationState, DevicePatch, DeviceRecord, ParseStateError, UplinkState};
pub use entity_id::{EntityId, MacAddress};
pub use gateway::GatewayRecord;
pub use log::{LogSnapshot, LogStatus, NO_LOGS_PLACEHOLDER};
pub use summary::FleetSummary;

/// Any record held by the fleet registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FleetRecord {
    Device(Arc<DeviceRecord>),
    Gateway(Arc<GatewayRecord>),
}

impl FleetRecord {
    pub fn id(&self) -> &EntityId {
        match self {
            Self::Device(d) => &d.id,
            Self::Gateway(g) => &g.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Device(d) => &d.name,
            Self::Gateway(g) => &g.name,
        }
    }

    pub fn as_device(&self) -> Option<&DeviceRecord> {
        match self {
            Self::Device(d) => Some(d),
            Self::Gateway(_) => None,
        }
    }

    pub fn as_gateway(&self) -> Option<&GatewayRecord> {
        match self {
            Self::Gateway(g) => Some(g),
            Self::Device(_) => None,
        }
    }
}
