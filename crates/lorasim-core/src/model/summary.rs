// ── Dashboard counters ──

use serde::{Deserialize, Serialize};

/// Fleet-wide counters shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetSummary {
    pub total_devices: u32,
    pub active_devices: u32,
    pub total_gateways: u32,
}

impl FleetSummary {
    pub fn inactive_devices(&self) -> u32 {
        self.total_devices.saturating_sub(self.active_devices)
    }
}
