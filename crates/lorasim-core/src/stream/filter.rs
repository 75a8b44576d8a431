// ── Filter predicates for entity streams ──
//
// Used by list views to narrow snapshots without re-querying the API.

use crate::model::{ActivationState, DeviceRecord, EntityId, GatewayRecord, UplinkState};

/// Filter predicate for device collections.
pub enum DeviceFilter {
    All,
    ByActivation(ActivationState),
    ByUplink(UplinkState),
    ByGateway(EntityId),
    ByRegion(String),
    Custom(Box<dyn Fn(&DeviceRecord) -> bool + Send + Sync>),
}

impl DeviceFilter {
    pub fn matches(&self, device: &DeviceRecord) -> bool {
        match self {
            Self::All => true,
            Self::ByActivation(state) => device.activation == *state,
            Self::ByUplink(state) => device.uplink == *state,
            Self::ByGateway(gw) => device.gateway_id.as_ref() == Some(gw),
            Self::ByRegion(region) => device
                .region
                .as_deref()
                .is_some_and(|r| r.eq_ignore_ascii_case(region)),
            Self::Custom(f) => f(device),
        }
    }
}

/// Filter predicate for gateway collections.
pub enum GatewayFilter {
    All,
    Virtual,
    Real,
    Custom(Box<dyn Fn(&GatewayRecord) -> bool + Send + Sync>),
}

impl GatewayFilter {
    pub fn matches(&self, gateway: &GatewayRecord) -> bool {
        match self {
            Self::All => true,
            Self::Virtual => gateway.is_virtual,
            Self::Real => !gateway.is_virtual,
            Self::Custom(f) => f(gateway),
        }
    }
}
