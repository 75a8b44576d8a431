// ── Generic reactive entity collection ──
//
// Lock-free concurrent storage with O(1) lookups and push-based
// change notification via `watch` channels. Snapshots keep the order in
// which entities were last delivered by the remote.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::watch;

use crate::model::EntityId;

struct Slot<T> {
    /// Position in remote order; lower sorts first.
    seq: u64,
    value: Arc<T>,
}

/// A lock-free, reactive collection for a single entity type.
///
/// Uses `DashMap` for O(1) concurrent lookups and `watch` channels
/// for push-based change notification. Every mutating call rebuilds
/// and broadcasts the snapshot once, however many entities it touched.
pub(crate) struct EntityCollection<T: Clone + Send + Sync + 'static> {
    by_id: DashMap<EntityId, Slot<T>>,

    next_seq: AtomicU64,

    /// Full snapshot in remote order, rebuilt on mutation.
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: Clone + Send + Sync + 'static> EntityCollection<T> {
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_id: DashMap::new(),
            next_seq: AtomicU64::new(0),
            snapshot,
        }
    }

    /// Replace the whole collection with `items`, in the given order.
    ///
    /// Entities are upserted first and missing ids pruned afterwards, so
    /// lookups never observe an empty collection mid-refresh.
    pub(crate) fn replace_all(&self, items: Vec<(EntityId, T)>) {
        let keep: std::collections::HashSet<EntityId> =
            items.iter().map(|(id, _)| id.clone()).collect();

        for (id, entity) in items {
            self.insert_quiet(id, entity);
        }
        self.by_id.retain(|id, _| keep.contains(id));

        self.publish();
    }

    /// Replace each listed entity with `f(current)`. Unknown ids are
    /// skipped. Returns how many entities actually changed; subscribers
    /// are notified once, and only if something changed.
    pub(crate) fn update_many<F>(&self, ids: &[EntityId], f: F) -> usize
    where
        T: PartialEq,
        F: Fn(&T) -> T,
    {
        let mut changed = 0;
        for id in ids {
            if let Some(mut slot) = self.by_id.get_mut(id) {
                let next = f(slot.value.as_ref());
                if next != *slot.value {
                    slot.value = Arc::new(next);
                    changed += 1;
                }
            }
        }
        if changed > 0 {
            self.publish();
        }
        changed
    }

    /// Remove every listed entity. Returns the ids that were present.
    pub(crate) fn remove_many(&self, ids: &[EntityId]) -> Vec<EntityId> {
        let removed: Vec<EntityId> = ids
            .iter()
            .filter_map(|id| self.by_id.remove(id).map(|(id, _)| id))
            .collect();
        if !removed.is_empty() {
            self.publish();
        }
        removed
    }

    /// Look up an entity by id.
    pub(crate) fn get(&self, id: &EntityId) -> Option<Arc<T>> {
        self.by_id.get(id).map(|slot| Arc::clone(&slot.value))
    }

    pub(crate) fn contains(&self, id: &EntityId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes via a `watch::Receiver`.
    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Store an entity at the end of the order without notifying.
    fn insert_quiet(&self, id: EntityId, entity: T) {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.by_id.insert(
            id,
            Slot {
                seq,
                value: Arc::new(entity),
            },
        );
    }

    /// Rebuild the ordered snapshot and broadcast it.
    fn publish(&self) {
        let mut slots: Vec<(u64, Arc<T>)> = self
            .by_id
            .iter()
            .map(|r| (r.seq, Arc::clone(&r.value)))
            .collect();
        slots.sort_unstable_by_key(|(seq, _)| *seq);
        let values: Vec<Arc<T>> = slots.into_iter().map(|(_, v)| v).collect();

        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }
}
