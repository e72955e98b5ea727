//! # Track Topology Contract
//!
//! The feature model never owns tracks or edges. It asks a [`TrackTopology`]
//! which tracks exist, which are filtered, and which edges each track holds.
//!
//! ## Implementations
//!
//! | Topology | Module | Description |
//! |----------|--------|-------------|
//! | `MemoryTopology` | `memory` | In-memory reference graph for tests and embedding |
//!
//! The feature model only reads from the topology. Implementations must be
//! safe to query from many computation workers at once.

pub mod memory;

use std::sync::Arc;

use crate::model::{EdgeId, TrackId};

pub use memory::MemoryTopology;

/// What the feature model needs to know about the track graph.
pub trait TrackTopology: Send + Sync {
    /// Track IDs in enumeration order. With `filtered_only`, only the tracks
    /// currently marked as filtered.
    fn track_ids(&self, filtered_only: bool) -> Vec<TrackId>;

    /// Edges of one track, in the topology's order. Empty for unknown tracks.
    fn track_edges(&self, track: TrackId) -> Vec<EdgeId>;

    /// Number of tracks, filtered or not.
    fn track_count(&self) -> usize;

    /// Whether the edge is currently part of the topology.
    fn contains_edge(&self, edge: EdgeId) -> bool;

    /// Whether the track is currently part of the topology.
    ///
    /// Defaults to membership in the full track ID set. Implementations with
    /// an index should override it.
    fn contains_track(&self, track: TrackId) -> bool {
        self.track_ids(false).contains(&track)
    }
}

impl<T: TrackTopology + ?Sized> TrackTopology for Arc<T> {
    fn track_ids(&self, filtered_only: bool) -> Vec<TrackId> {
        (**self).track_ids(filtered_only)
    }

    fn track_edges(&self, track: TrackId) -> Vec<EdgeId> {
        (**self).track_edges(track)
    }

    fn track_count(&self) -> usize {
        (**self).track_count()
    }

    fn contains_edge(&self, edge: EdgeId) -> bool {
        (**self).contains_edge(edge)
    }

    fn contains_track(&self, track: TrackId) -> bool {
        (**self).contains_track(track)
    }
}
