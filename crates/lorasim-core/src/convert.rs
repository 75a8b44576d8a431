// ── API-to-domain type conversions ──
//
// Bridges raw `lorasim_api` response types into canonical
// `lorasim_core::model` domain types. Missing status fields default to
// paused/stopped, and records breaking the uplink invariant are repaired.

use tracing::{debug, warn};

use lorasim_api::models::{DashboardSummary, SimDevice, SimGateway};

use crate::model::{
    ActivationState, DeviceRecord, EntityId, FleetSummary, GatewayRecord, MacAddress, UplinkState,
};

// ── Helpers ────────────────────────────────────────────────────────

/// Parse a status field, falling back to the default on missing or
/// unrecognized values.
fn parse_state<T>(raw: Option<&String>, field: &str, dev_eui: &str) -> T
where
    T: std::str::FromStr + Default,
{
    match raw {
        None => T::default(),
        Some(s) => s.parse().unwrap_or_else(|_| {
            debug!(dev_eui, field, value = %s, "unrecognized device state, using default");
            T::default()
        }),
    }
}

/// Treat empty strings from the backend as absent.
fn non_empty(raw: Option<String>) -> Option<String> {
    raw.filter(|s| !s.trim().is_empty())
}

// ── Devices ────────────────────────────────────────────────────────

impl From<SimDevice> for DeviceRecord {
    fn from(d: SimDevice) -> Self {
        let activation: ActivationState =
            parse_state(d.current_status.as_ref(), "currentStatus", &d.dev_eui);
        let uplink: UplinkState = parse_state(d.uplink_status.as_ref(), "uplinkStatus", &d.dev_eui);

        let record = DeviceRecord {
            name: non_empty(d.name).unwrap_or_else(|| d.dev_eui.clone()),
            gateway_id: non_empty(d.gateway).map(EntityId::from),
            region: non_empty(d.region),
            id: EntityId::from(d.dev_eui),
            activation,
            uplink,
        };

        if !record.is_consistent() {
            warn!(
                dev_eui = %record.id,
                "device reports a running uplink while paused, treating uplink as stopped"
            );
        }
        record.normalized()
    }
}

// ── Gateways ───────────────────────────────────────────────────────

impl From<SimGateway> for GatewayRecord {
    fn from(g: SimGateway) -> Self {
        let id = EntityId::from(g.id.oid);
        GatewayRecord {
            name: non_empty(g.name).unwrap_or_else(|| id.to_string()),
            mac: non_empty(g.mac_address).map(MacAddress::new),
            is_virtual: g.type_gateway,
            device_count: g.no_of_devices.unwrap_or(0),
            id,
        }
    }
}

// ── Dashboard ──────────────────────────────────────────────────────

impl From<DashboardSummary> for FleetSummary {
    fn from(s: DashboardSummary) -> Self {
        FleetSummary {
            total_devices: s.total_devices,
            active_devices: s.active_devices,
            total_gateways: s.total_gateways,
        }
    }
}
