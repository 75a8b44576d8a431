// ── Device domain types ──

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::entity_id::EntityId;

/// Whether the simulator is running the device's join/uplink cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationState {
    #[default]
    Paused,
    Playing,
}

/// Whether the device is currently emitting uplinks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UplinkState {
    #[default]
    Stopped,
    Running,
}

impl ActivationState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Paused => "paused",
            Self::Playing => "playing",
        }
    }
}

impl UplinkState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Running => "running",
        }
    }
}

impl fmt::Display for ActivationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for UplinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a state string is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} state: {value}")]
pub struct ParseStateError {
    kind: &'static str,
    value: String,
}

impl FromStr for ActivationState {
    type Err = ParseStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "paused" => Ok(Self::Paused),
            "playing" => Ok(Self::Playing),
            _ => Err(ParseStateError {
                kind: "activation",
                value: s.to_owned(),
            }),
        }
    }
}

impl FromStr for UplinkState {
    type Err = ParseStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stopped" => Ok(Self::Stopped),
            "running" => Ok(Self::Running),
            _ => Err(ParseStateError {
                kind: "uplink",
                value: s.to_owned(),
            }),
        }
    }
}

/// A simulated end-device as tracked by the fleet registry.
///
/// Invariant: `uplink == Running` implies `activation == Playing`.
/// [`normalized`](Self::normalized) restores it for records that arrive
/// from outside the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub id: EntityId,
    pub name: String,
    pub gateway_id: Option<EntityId>,
    pub region: Option<String>,
    pub activation: ActivationState,
    pub uplink: UplinkState,
}

impl DeviceRecord {
    pub fn is_playing(&self) -> bool {
        self.activation == ActivationState::Playing
    }

    pub fn is_uplink_running(&self) -> bool {
        self.uplink == UplinkState::Running
    }

    /// Whether the activation/uplink invariant holds.
    pub fn is_consistent(&self) -> bool {
        !(self.is_uplink_running() && !self.is_playing())
    }

    /// Force a paused device's uplink to `Stopped`.
    pub fn normalized(mut self) -> Self {
        if !self.is_consistent() {
            self.uplink = UplinkState::Stopped;
        }
        self
    }
}

/// Partial update applied to device records by the registry.
///
/// Fields left as `None` are untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevicePatch {
    pub activation: Option<ActivationState>,
    pub uplink: Option<UplinkState>,
}

impl DevicePatch {
    pub fn activation(state: ActivationState) -> Self {
        Self {
            activation: Some(state),
            uplink: None,
        }
    }

    pub fn uplink(state: UplinkState) -> Self {
        Self {
            activation: None,
            uplink: Some(state),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.activation.is_none() && self.uplink.is_none()
    }

    /// Apply the patch to a copy of `record`. The result always satisfies
    /// the activation/uplink invariant.
    pub fn apply(&self, record: &DeviceRecord) -> DeviceRecord {
        let mut next = record.clone();
        if let Some(activation) = self.activation {
            next.activation = activation;
        }
        if let Some(uplink) = self.uplink {
            next.uplink = uplink;
        }
        next.normalized()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn device(activation: ActivationState, uplink: UplinkState) -> DeviceRecord {
        DeviceRecord {
            id: EntityId::from("D1"),
            name: "probe".into(),
            gateway_id: None,
            region: Some("EU868".into()),
            activation,
            uplink,
        }
    }

    #[test]
    fn states_parse_case_insensitively() {
        assert_eq!(
            "Playing".parse::<ActivationState>().unwrap(),
            ActivationState::Playing
        );
        assert_eq!(" running ".parse::<UplinkState>().unwrap(), UplinkState::Running);
        assert!("joined".parse::<ActivationState>().is_err());
    }

    #[test]
    fn states_serialize_lowercase() {
        let json = serde_json::to_string(&ActivationState::Playing).unwrap();
        assert_eq!(json, "\"playing\"");
    }

    #[test]
    fn normalized_stops_uplink_on_paused_device() {
        let record = device(ActivationState::Paused, UplinkState::Running).normalized();
        assert_eq!(record.uplink, UplinkState::Stopped);
        assert!(record.is_consistent());
    }

    #[test]
    fn patch_leaves_unlisted_fields() {
        let record = device(ActivationState::Playing, UplinkState::Stopped);
        let next = DevicePatch::uplink(UplinkState::Running).apply(&record);
        assert_eq!(next.activation, ActivationState::Playing);
        assert_eq!(next.uplink, UplinkState::Running);
        assert_eq!(next.name, record.name);
    }

    #[test]
    fn pausing_patch_cannot_leave_uplink_running() {
        let record = device(ActivationState::Playing, UplinkState::Running);
        let next = DevicePatch::activation(ActivationState::Paused).apply(&record);
        assert_eq!(next.uplink, UplinkState::Stopped);
    }

    #[test]
    fn patch_is_idempotent() {
        let record = device(ActivationState::Paused, UplinkState::Stopped);
        let patch = DevicePatch::activation(ActivationState::Playing);
        let once = patch.apply(&record);
        assert_eq!(patch.apply(&once), once);
    }
}
