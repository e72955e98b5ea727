//! In-memory track topology.
//!
//! Reference implementation of `TrackTopology`: tracks in a `BTreeMap`
//! (so enumeration order is ascending track ID), edges in a hash map, all
//! behind one `RwLock`.
//!
//! ## Limitations
//!
//! - **No spot graph**: edges are attached to tracks directly. Connectivity
//!   is not checked, so a track is whatever edges were linked into it.
//! - **No notifications**: removing a track or edge does not tell any
//!   feature model. Callers forward removals through
//!   `FeatureModel::on_track_removed` / `on_edge_removed`.
//!
//! Use it for tests, and for embedding when the real graph lives elsewhere
//! and only its track/edge membership needs mirroring.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use hashbrown::HashMap;
use parking_lot::RwLock;
use smallvec::SmallVec;

use crate::model::*;
use super::TrackTopology;

/// Edge list of one track. Most tracks are short.
type EdgeList = SmallVec<[EdgeId; 8]>;

#[derive(Debug, Default)]
struct TrackEntry {
    edges: EdgeList,
    filtered: bool,
}

#[derive(Debug, Default)]
struct TopologyInner {
    tracks: BTreeMap<TrackId, TrackEntry>,
    /// edge → (edge, owning track)
    edges: HashMap<EdgeId, (Edge, TrackId)>,
}

// ============================================================================
// MemoryTopology
// ============================================================================

/// In-memory track/edge membership.
#[derive(Debug)]
pub struct MemoryTopology {
    inner: RwLock<TopologyInner>,
    next_edge_id: AtomicU64,
}

impl MemoryTopology {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(TopologyInner::default()),
            next_edge_id: AtomicU64::new(1),
        }
    }

    /// Add an empty track. New tracks are filtered in. Returns false if the
    /// ID is taken.
    pub fn add_track(&self, id: TrackId) -> bool {
        let mut inner = self.inner.write();
        if inner.tracks.contains_key(&id) {
            return false;
        }
        inner.tracks.insert(id, TrackEntry { edges: EdgeList::new(), filtered: true });
        true
    }

    /// Link two spots inside `track` with a fresh edge identity.
    ///
    /// Returns `None` if the track does not exist.
    pub fn link(&self, track: TrackId, source: SpotId, target: SpotId) -> Option<EdgeId> {
        let mut inner = self.inner.write();
        let entry = inner.tracks.get_mut(&track)?;
        let id = EdgeId(self.next_edge_id.fetch_add(1, Ordering::Relaxed));
        entry.edges.push(id);
        inner.edges.insert(id, (Edge::new(id, source, target), track));
        Some(id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<Edge> {
        self.inner.read().edges.get(&id).map(|(e, _)| *e)
    }

    pub fn track_of(&self, edge: EdgeId) -> Option<TrackId> {
        self.inner.read().edges.get(&edge).map(|(_, t)| *t)
    }

    /// Remove one edge from its track.
    pub fn remove_edge(&self, id: EdgeId) -> Option<Edge> {
        let mut inner = self.inner.write();
        let (edge, track) = inner.edges.remove(&id)?;
        if let Some(entry) = inner.tracks.get_mut(&track) {
            entry.edges.retain(|e| *e != id);
        }
        Some(edge)
    }

    /// Remove a track and all its edges. Returns the removed edge IDs.
    pub fn remove_track(&self, id: TrackId) -> Option<Vec<EdgeId>> {
        let mut inner = self.inner.write();
        let entry = inner.tracks.remove(&id)?;
        for edge in &entry.edges {
            inner.edges.remove(edge);
        }
        Some(entry.edges.into_vec())
    }

    /// Move every edge of `from` into `into` and delete `from`.
    ///
    /// Returns false, changing nothing, if either track is missing or they
    /// are the same track.
    pub fn merge_tracks(&self, into: TrackId, from: TrackId) -> bool {
        if into == from {
            return false;
        }
        let mut inner = self.inner.write();
        if !inner.tracks.contains_key(&into) {
            return false;
        }
        let Some(moved) = inner.tracks.remove(&from) else {
            return false;
        };
        for edge in &moved.edges {
            if let Some((_, owner)) = inner.edges.get_mut(edge) {
                *owner = into;
            }
        }
        if let Some(target) = inner.tracks.get_mut(&into) {
            target.edges.extend(moved.edges);
        }
        true
    }

    /// Mark a track as filtered in or out. Returns false if it does not exist.
    pub fn set_filtered(&self, id: TrackId, filtered: bool) -> bool {
        match self.inner.write().tracks.get_mut(&id) {
            Some(entry) => {
                entry.filtered = filtered;
                true
            }
            None => false,
        }
    }

    pub fn total_edge_count(&self) -> usize {
        self.inner.read().edges.len()
    }
}

impl Default for MemoryTopology {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TrackTopology impl
// ============================================================================

impl TrackTopology for MemoryTopology {
    fn track_ids(&self, filtered_only: bool) -> Vec<TrackId> {
        self.inner.read().tracks.iter()
            .filter(|(_, entry)| !filtered_only || entry.filtered)
            .map(|(id, _)| *id)
            .collect()
    }

    fn track_edges(&self, track: TrackId) -> Vec<EdgeId> {
        self.inner.read().tracks.get(&track)
            .map(|entry| entry.edges.to_vec())
            .unwrap_or_default()
    }

    fn track_count(&self) -> usize {
        self.inner.read().tracks.len()
    }

    fn contains_edge(&self, edge: EdgeId) -> bool {
        self.inner.read().edges.contains_key(&edge)
    }

    fn contains_track(&self, track: TrackId) -> bool {
        self.inner.read().tracks.contains_key(&track)
    }
}
