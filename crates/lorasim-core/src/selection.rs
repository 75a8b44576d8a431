// ── Selection ──
//
// The operator's multi-row pick. Holds ids only; every gate re-reads the
// registry when it is evaluated, so a selection never carries stale
// record data.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::model::EntityId;

/// Ordered set of unique record ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection {
    ids: IndexSet<EntityId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id`. Returns `false` if it was already selected.
    pub fn select(&mut self, id: EntityId) -> bool {
        self.ids.insert(id)
    }

    /// Remove `id`, keeping the order of the rest.
    pub fn deselect(&mut self, id: &EntityId) -> bool {
        self.ids.shift_remove(id)
    }

    /// Flip membership of `id`. Returns whether it is now selected.
    pub fn toggle(&mut self, id: EntityId) -> bool {
        if self.ids.shift_remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityId> {
        self.ids.iter()
    }

    pub fn to_vec(&self) -> Vec<EntityId> {
        self.ids.iter().cloned().collect()
    }
}

impl FromIterator<EntityId> for Selection {
    fn from_iter<I: IntoIterator<Item = EntityId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Selection {
    type Item = &'a EntityId;
    type IntoIter = indexmap::set::Iter<'a, EntityId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter()
    }
}
