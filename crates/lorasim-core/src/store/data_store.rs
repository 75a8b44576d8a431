// ── Fleet registry ──
//
// Thread-safe, lock-free storage for every device and gateway record.
// Mutations are broadcast to subscribers via `watch` channels.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::debug;

use super::collection::EntityCollection;
use crate::model::{
    ActivationState, DevicePatch, DeviceRecord, EntityId, FleetRecord, FleetSummary,
    GatewayRecord,
};
use crate::stream::EntityStream;

/// The fleet registry: authoritative local copy of every device and
/// gateway known to the simulator.
///
/// Thread-safe and lock-free: all reads are wait-free, writes use
/// fine-grained per-shard locks within `DashMap`. Records handed out are
/// immutable snapshots; the registry only changes through
/// [`upsert`](Self::upsert), [`remove`](Self::remove) and a full refresh.
pub struct DataStore {
    pub(crate) devices: EntityCollection<DeviceRecord>,
    pub(crate) gateways: EntityCollection<GatewayRecord>,
    /// Bumped once per mutating call. This is the "registry changed" signal.
    pub(crate) revision: watch::Sender<u64>,
    pub(crate) last_refresh: watch::Sender<Option<DateTime<Utc>>>,
}

impl DataStore {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        let (last_refresh, _) = watch::channel(None);

        Self {
            devices: EntityCollection::new(),
            gateways: EntityCollection::new(),
            revision,
            last_refresh,
        }
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    /// Every record, devices first, each group in remote order.
    pub fn list(&self) -> Vec<FleetRecord> {
        let devices = self.devices.snapshot();
        let gateways = self.gateways.snapshot();
        devices
            .iter()
            .map(|d| FleetRecord::Device(Arc::clone(d)))
            .chain(gateways.iter().map(|g| FleetRecord::Gateway(Arc::clone(g))))
            .collect()
    }

    pub fn devices_snapshot(&self) -> Arc<Vec<Arc<DeviceRecord>>> {
        self.devices.snapshot()
    }

    pub fn gateways_snapshot(&self) -> Arc<Vec<Arc<GatewayRecord>>> {
        self.gateways.snapshot()
    }

    // ── Single-entity lookups ────────────────────────────────────────

    pub fn device(&self, id: &EntityId) -> Option<Arc<DeviceRecord>> {
        self.devices.get(id)
    }

    pub fn gateway(&self, id: &EntityId) -> Option<Arc<GatewayRecord>> {
        self.gateways.get(id)
    }

    /// Look up a record of either kind.
    pub fn record(&self, id: &EntityId) -> Option<FleetRecord> {
        self.device(id)
            .map(FleetRecord::Device)
            .or_else(|| self.gateway(id).map(FleetRecord::Gateway))
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.devices.contains(id) || self.gateways.contains(id)
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Apply `patch` to every listed device. Unknown ids and gateway ids
    /// are skipped; fields the patch leaves as `None` are untouched.
    ///
    /// Idempotent. Returns the number of records that changed and
    /// notifies subscribers once if that number is non-zero.
    pub fn upsert(&self, ids: &[EntityId], patch: &DevicePatch) -> usize {
        if patch.is_empty() {
            return 0;
        }
        let changed = self.devices.update_many(ids, |d| patch.apply(d));
        if changed > 0 {
            debug!(changed, requested = ids.len(), "patched device records");
            self.bump_revision();
        }
        changed
    }

    /// Drop the listed records of either kind. Returns the ids that were
    /// present.
    pub fn remove(&self, ids: &[EntityId]) -> Vec<EntityId> {
        let mut removed = self.devices.remove_many(ids);
        removed.extend(self.gateways.remove_many(ids));
        if !removed.is_empty() {
            debug!(removed = removed.len(), "removed fleet records");
            self.bump_revision();
        }
        removed
    }

    // ── Counts / metadata ────────────────────────────────────────────

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn gateway_count(&self) -> usize {
        self.gateways.len()
    }

    /// Dashboard counters computed from local state.
    pub fn summary(&self) -> FleetSummary {
        let devices = self.devices.snapshot();
        let active = devices
            .iter()
            .filter(|d| d.activation == ActivationState::Playing)
            .count();
        FleetSummary {
            total_devices: saturating_u32(devices.len()),
            active_devices: saturating_u32(active),
            total_gateways: saturating_u32(self.gateways.len()),
        }
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.borrow()
    }

    /// Current revision number (bumped on every change).
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Fires once per registry change with the new revision number.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn subscribe_devices(&self) -> EntityStream<DeviceRecord> {
        EntityStream::new(self.devices.subscribe())
    }

    pub fn subscribe_gateways(&self) -> EntityStream<GatewayRecord> {
        EntityStream::new(self.gateways.subscribe())
    }

    pub(crate) fn bump_revision(&self) {
        self.revision.send_modify(|r| *r += 1);
    }
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}
