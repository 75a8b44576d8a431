// ── Command API ──
//
// The four batched device commands, their gate predicates, and the
// confirmation seam used by deletes. Gates are pure functions of the
// registry and the selection, evaluated fresh on every call.

use serde::Serialize;

use crate::model::{ActivationState, DevicePatch, DeviceRecord, EntityId, UplinkState};
use crate::selection::Selection;
use crate::store::DataStore;

/// A batched command applied to every device in a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FleetCommand {
    StartDevices,
    StopDevices,
    StartUplink,
    StopUplink,
}

impl FleetCommand {
    pub const ALL: [FleetCommand; 4] = [
        Self::StartDevices,
        Self::StopDevices,
        Self::StartUplink,
        Self::StopUplink,
    ];

    /// Verb phrase used in operator-facing messages.
    pub fn verb(self) -> &'static str {
        match self {
            Self::StartDevices => "start",
            Self::StopDevices => "stop",
            Self::StartUplink => "start uplink on",
            Self::StopUplink => "stop uplink on",
        }
    }

    /// Whether a single device may take part in this command.
    pub fn allows(self, device: &DeviceRecord) -> bool {
        match self {
            Self::StartDevices => device.activation == ActivationState::Paused,
            Self::StopDevices => device.activation == ActivationState::Playing,
            Self::StartUplink => device.is_playing() && device.uplink == UplinkState::Stopped,
            Self::StopUplink => device.is_playing() && device.uplink == UplinkState::Running,
        }
    }

    /// Why a selection was rejected by this command's gate.
    pub fn requirement(self) -> &'static str {
        match self {
            Self::StartDevices => "select devices that are not already joined",
            Self::StopDevices => "select devices that are already joined",
            Self::StartUplink => "select joined devices with stopped uplinks",
            Self::StopUplink => "select joined devices with running uplinks",
        }
    }

    /// Local update applied to every member once the remote accepts the batch.
    pub fn patch(self) -> DevicePatch {
        match self {
            Self::StartDevices => DevicePatch::activation(ActivationState::Playing),
            // Pausing a device also halts its uplink.
            Self::StopDevices => DevicePatch {
                activation: Some(ActivationState::Paused),
                uplink: Some(UplinkState::Stopped),
            },
            Self::StartUplink => DevicePatch::uplink(UplinkState::Running),
            Self::StopUplink => DevicePatch::uplink(UplinkState::Stopped),
        }
    }

    /// The command's gate: `selection` is non-empty and every member is a
    /// known device that [`allows`](Self::allows) the command.
    pub fn gate(self, store: &DataStore, selection: &Selection) -> bool {
        !selection.is_empty()
            && selection
                .iter()
                .all(|id| store.device(id).is_some_and(|d| self.allows(&d)))
    }
}

impl std::fmt::Display for FleetCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::StartDevices => "start devices",
            Self::StopDevices => "stop devices",
            Self::StartUplink => "start uplink",
            Self::StopUplink => "stop uplink",
        })
    }
}

// ── Gates ────────────────────────────────────────────────────────────

/// Which controls are enabled for a selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GateState {
    pub can_start: bool,
    pub can_stop: bool,
    pub can_start_uplink: bool,
    pub can_stop_uplink: bool,
    /// Exactly one selected record, and it exists.
    pub can_edit: bool,
    /// Non-empty selection whose members all exist.
    pub can_delete: bool,
}

impl GateState {
    pub fn evaluate(store: &DataStore, selection: &Selection) -> Self {
        let all_exist = !selection.is_empty() && selection.iter().all(|id| store.contains(id));
        Self {
            can_start: FleetCommand::StartDevices.gate(store, selection),
            can_stop: FleetCommand::StopDevices.gate(store, selection),
            can_start_uplink: FleetCommand::StartUplink.gate(store, selection),
            can_stop_uplink: FleetCommand::StopUplink.gate(store, selection),
            can_edit: selection.len() == 1 && all_exist,
            can_delete: all_exist,
        }
    }

    pub fn allows(&self, command: FleetCommand) -> bool {
        match command {
            FleetCommand::StartDevices => self.can_start,
            FleetCommand::StopDevices => self.can_stop,
            FleetCommand::StartUplink => self.can_start_uplink,
            FleetCommand::StopUplink => self.can_stop_uplink,
        }
    }
}

// ── Results ──────────────────────────────────────────────────────────

/// Outcome of a successful batched command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandResult {
    pub command: FleetCommand,
    /// Ids sent to the remote in the batch.
    pub ids: Vec<EntityId>,
    /// Registry records whose state actually changed.
    pub changed: usize,
}

/// Outcome of a delete request that did not fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum DeleteOutcome {
    /// The operator declined the confirmation; nothing was sent.
    Cancelled,
    /// Every listed record was deleted.
    Deleted { ids: Vec<EntityId> },
}

// ── Confirmation ─────────────────────────────────────────────────────

/// Yes/no gate asked before destructive operations.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::GatewayRecord;
    use pretty_assertions::assert_eq;

    fn device(id: &str, activation: ActivationState, uplink: UplinkState) -> DeviceRecord {
        DeviceRecord {
            id: EntityId::from(id),
            name: id.to_owned(),
            gateway_id: None,
            region: None,
            activation,
            uplink,
        }
    }

    fn store() -> DataStore {
        let store = DataStore::new();
        store.apply_refresh(
            vec![
                device("P1", ActivationState::Paused, UplinkState::Stopped),
                device("P2", ActivationState::Paused, UplinkState::Stopped),
                device("S1", ActivationState::Playing, UplinkState::Stopped),
                device("R1", ActivationState::Playing, UplinkState::Running),
                device("R2", ActivationState::Playing, UplinkState::Running),
            ],
            vec![GatewayRecord {
                id: EntityId::from("G1"),
                name: "gw".into(),
                mac: None,
                is_virtual: true,
                device_count: 0,
            }],
        );
        store
    }

    fn sel(ids: &[&str]) -> Selection {
        ids.iter().copied().map(EntityId::from).collect()
    }

    #[test]
    fn empty_selection_closes_every_gate() {
        assert_eq!(GateState::evaluate(&store(), &Selection::new()), GateState::default());
    }

    #[test]
    fn uniform_paused_selection_can_only_start() {
        let gates = GateState::evaluate(&store(), &sel(&["P1", "P2"]));
        assert_eq!(
            gates,
            GateState {
                can_start: true,
                can_delete: true,
                ..GateState::default()
            }
        );
    }

    #[test]
    fn running_selection_can_stop_and_stop_uplink() {
        let gates = GateState::evaluate(&store(), &sel(&["R1", "R2"]));
        assert!(gates.can_stop);
        assert!(gates.can_stop_uplink);
        assert!(!gates.can_start);
        assert!(!gates.can_start_uplink);
    }

    #[test]
    fn mixed_selection_fails_uniform_gates() {
        let gates = GateState::evaluate(&store(), &sel(&["R1", "P1"]));
        assert!(!gates.can_start);
        assert!(!gates.can_stop);
        assert!(!gates.can_stop_uplink);
        assert!(gates.can_delete);
    }

    #[test]
    fn playing_with_stopped_uplink_can_start_uplink() {
        let gates = GateState::evaluate(&store(), &sel(&["S1"]));
        assert!(gates.can_start_uplink);
        assert!(gates.can_stop);
        assert!(gates.can_edit);
    }

    #[test]
    fn unknown_or_gateway_members_fail_device_gates() {
        let store = store();
        assert!(!FleetCommand::StartDevices.gate(&store, &sel(&["P1", "ghost"])));
        let with_gateway = GateState::evaluate(&store, &sel(&["P1", "G1"]));
        assert!(!with_gateway.can_start);
        assert!(with_gateway.can_delete);
        assert!(!GateState::evaluate(&store, &sel(&["ghost"])).can_delete);
    }

    #[test]
    fn gate_law_matches_member_predicate() {
        let store = store();
        let pool = ["P1", "P2", "S1", "R1", "R2"];
        // Every non-empty subset of the pool.
        for mask in 1u32..(1 << pool.len()) {
            let ids: Vec<&str> = pool
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, id)| *id)
                .collect();
            let selection = sel(&ids);
            for cmd in FleetCommand::ALL {
                let expected = ids
                    .iter()
                    .all(|id| cmd.allows(&store.device(&EntityId::from(*id)).unwrap()));
                assert_eq!(cmd.gate(&store, &selection), expected, "{cmd} on {ids:?}");
            }
        }
    }

    #[test]
    fn stop_patch_halts_uplink() {
        let patch = FleetCommand::StopDevices.patch();
        let next = patch.apply(&device("R1", ActivationState::Playing, UplinkState::Running));
        assert_eq!(next.activation, ActivationState::Paused);
        assert_eq!(next.uplink, UplinkState::Stopped);
    }

    #[test]
    fn closures_confirm() {
        let yes = |_: &str| true;
        let no = |prompt: &str| prompt.is_empty();
        assert!(yes.confirm("delete?"));
        assert!(!no.confirm("delete?"));
    }
}
