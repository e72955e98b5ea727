//! Concurrent feature value storage.
//!
//! One [`ValueStore`] per value-bearing entity kind (tracks, edges). Each
//! entity owns a small map feature key → value, created on first write.
//!
//! ## Concurrency
//!
//! Entity maps live in a sharded `DashMap`. A write takes the shard lock for
//! the entity through `entry().or_default()`, so the per-entity map is
//! created exactly once even when two first writers race, and writes of
//! distinct keys to one entity are never lost. Two writes of the same key
//! race last-write-wins.
//!
//! The store does not know which keys are declared or which entities exist.
//! Both checks are made by `FeatureModel` before a value reaches the store.

use std::hash::Hash;

use dashmap::DashMap;
use hashbrown::HashMap;

// ============================================================================
// PutOutcome
// ============================================================================

/// Result of storing one feature value.
///
/// Rejections are ordinary outcomes in batch computation, not errors.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PutOutcome {
    Stored,
    /// The topology does not know the target track or edge.
    UnknownEntity,
    /// The key is not declared in the entity kind's namespace.
    UndeclaredFeature,
}

impl PutOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self, PutOutcome::Stored)
    }
}

impl From<PutOutcome> for bool {
    fn from(outcome: PutOutcome) -> bool {
        outcome.is_stored()
    }
}

// ============================================================================
// ValueStore
// ============================================================================

/// Per-entity feature values, keyed by entity identity.
#[derive(Debug)]
pub struct ValueStore<Id: Eq + Hash> {
    values: DashMap<Id, HashMap<String, f64>>,
}

impl<Id: Eq + Hash + Copy> ValueStore<Id> {
    pub fn new() -> Self {
        Self { values: DashMap::new() }
    }

    /// `shard_amount` must be a power of two greater than one.
    pub fn with_capacity_and_shard_amount(capacity: usize, shard_amount: usize) -> Self {
        Self { values: DashMap::with_capacity_and_shard_amount(capacity, shard_amount) }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { values: DashMap::with_capacity(capacity) }
    }

    /// Record `value` for `(id, key)`, creating the entity map if needed.
    pub fn insert(&self, id: Id, key: &str, value: f64) {
        let mut map = self.values.entry(id).or_default();
        match map.get_mut(key) {
            Some(slot) => *slot = value,
            None => {
                map.insert(key.to_string(), value);
            }
        }
    }

    /// The stored value, or `None` when the entity or the key was never written.
    pub fn get(&self, id: Id, key: &str) -> Option<f64> {
        self.values.get(&id).and_then(|map| map.get(key).copied())
    }

    /// A detached copy of every value stored for `id`.
    pub fn entity_values(&self, id: Id) -> Option<HashMap<String, f64>> {
        self.values.get(&id).map(|map| map.clone())
    }

    pub fn contains_entity(&self, id: Id) -> bool {
        self.values.contains_key(&id)
    }

    /// Drop all values of one entity. Returns whether it had any.
    pub fn remove_entity(&self, id: Id) -> bool {
        self.values.remove(&id).is_some()
    }

    /// Keep only the entities for which `keep` returns true. Returns the
    /// number of entities dropped.
    pub fn retain_entities(&self, mut keep: impl FnMut(Id) -> bool) -> usize {
        let mut dropped = 0;
        self.values.retain(|id, _| {
            let k = keep(*id);
            if !k {
                dropped += 1;
            }
            k
        });
        dropped
    }

    pub fn clear(&self) {
        self.values.clear();
    }

    /// Number of entities with at least one stored map.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<Id: Eq + Hash + Copy> Default for ValueStore<Id> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TrackId;

    #[test]
    fn test_absent_entity_and_absent_key_look_the_same() {
        let store = ValueStore::new();
        store.insert(TrackId(1), "SPEED", 3.5);

        assert_eq!(store.get(TrackId(1), "SPEED"), Some(3.5));
        assert_eq!(store.get(TrackId(1), "DURATION"), None);
        assert_eq!(store.get(TrackId(2), "SPEED"), None);
    }

    #[test]
    fn test_overwrite() {
        let store = ValueStore::new();
        store.insert(TrackId(1), "SPEED", 1.0);
        store.insert(TrackId(1), "SPEED", 2.0);
        assert_eq!(store.get(TrackId(1), "SPEED"), Some(2.0));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_retain_counts_dropped_entities() {
        let store = ValueStore::new();
        for id in 0..10 {
            store.insert(TrackId(id), "X", id as f64);
        }
        let dropped = store.retain_entities(|id| id.0 % 2 == 0);
        assert_eq!(dropped, 5);
        assert_eq!(store.len(), 5);
        assert!(store.contains_entity(TrackId(4)));
        assert!(!store.contains_entity(TrackId(5)));
    }

    #[test]
    fn test_racing_first_writers_share_one_map() {
        let store = ValueStore::new();
        let keys: Vec<String> = (0..16).map(|i| format!("F{i}")).collect();

        std::thread::scope(|s| {
            for (i, key) in keys.iter().enumerate() {
                let store = &store;
                s.spawn(move || store.insert(TrackId(7), key, i as f64));
            }
        });

        assert_eq!(store.len(), 1);
        let values = store.entity_values(TrackId(7)).unwrap();
        assert_eq!(values.len(), keys.len());
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(values[key.as_str()], i as f64);
        }
    }
}
