// ── Gateway domain types ──

use serde::{Deserialize, Serialize};

use super::entity_id::{EntityId, MacAddress};

/// A LoRaWAN gateway known to the simulator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayRecord {
    pub id: EntityId,
    pub name: String,
    pub mac: Option<MacAddress>,
    /// `true` for gateways emulated by the simulator itself.
    pub is_virtual: bool,
    pub device_count: u32,
}

impl GatewayRecord {
    pub fn kind_label(&self) -> &'static str {
        if self.is_virtual { "Virtual" } else { "Real" }
    }
}
