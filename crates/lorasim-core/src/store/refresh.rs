// ── Full refresh application logic ──
//
// Replaces the registry contents with a fresh listing from the remote,
// overriding any optimistic local state.

use chrono::Utc;
use tracing::debug;

use super::DataStore;
use crate::model::{DeviceRecord, GatewayRecord};

impl DataStore {
    /// Apply a full listing from the remote.
    ///
    /// Both collections are upserted then pruned, so lookups never see a
    /// transiently empty registry. Subscribers get a single revision bump.
    pub(crate) fn apply_refresh(&self, devices: Vec<DeviceRecord>, gateways: Vec<GatewayRecord>) {
        let device_count = devices.len();
        let gateway_count = gateways.len();

        self.devices.replace_all(
            devices
                .into_iter()
                .map(|d| (d.id.clone(), d.normalized()))
                .collect(),
        );
        self.gateways
            .replace_all(gateways.into_iter().map(|g| (g.id.clone(), g)).collect());

        self.last_refresh.send_replace(Some(Utc::now()));
        self.bump_revision();

        debug!(
            devices = device_count,
            gateways = gateway_count,
            "registry refreshed"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::model::{ActivationState, DevicePatch, DeviceRecord, EntityId, UplinkState};
    use crate::store::DataStore;

    fn device(id: &str, activation: ActivationState) -> DeviceRecord {
        DeviceRecord {
            id: EntityId::from(id),
            name: id.to_owned(),
            gateway_id: None,
            region: None,
            activation,
            uplink: UplinkState::Stopped,
        }
    }

    #[test]
    fn refresh_overrides_optimistic_state() {
        let store = DataStore::new();
        store.apply_refresh(vec![device("D1", ActivationState::Paused)], Vec::new());
        store.upsert(
            &[EntityId::from("D1")],
            &DevicePatch::activation(ActivationState::Playing),
        );

        store.apply_refresh(vec![device("D1", ActivationState::Paused)], Vec::new());

        let d1 = store.device(&EntityId::from("D1")).unwrap();
        assert_eq!(d1.activation, ActivationState::Paused);
        assert!(store.last_refresh().is_some());
    }

    #[test]
    fn refresh_drops_records_missing_remotely() {
        let store = DataStore::new();
        store.apply_refresh(
            vec![
                device("D1", ActivationState::Paused),
                device("D2", ActivationState::Paused),
            ],
            Vec::new(),
        );
        store.apply_refresh(vec![device("D2", ActivationState::Paused)], Vec::new());

        assert!(store.device(&EntityId::from("D1")).is_none());
        assert_eq!(store.device_count(), 1);
    }

    #[test]
    fn refresh_is_one_notification() {
        let store = DataStore::new();
        let before = store.revision();
        store.apply_refresh(
            vec![
                device("D1", ActivationState::Paused),
                device("D2", ActivationState::Playing),
            ],
            Vec::new(),
        );
        assert_eq!(store.revision(), before + 1);
    }
}
