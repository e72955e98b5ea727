//! # track-features — Feature Model for Tracked Objects
//!
//! Declared numeric features on tracks and edges of a tracking graph: a
//! registry of feature metadata, a concurrent value store, and the
//! aggregation layer that turns stored values into flat arrays for plotting,
//! filtering and export.
//!
//! ## Design Principles
//!
//! 1. **Topology is injected**: the track graph belongs to someone else. A
//!    `FeatureModel` holds an `Arc` to anything implementing `TrackTopology`
//!    and only reads from it.
//! 2. **Declare before store**: a value can only be stored for a key whose
//!    name, short name and dimension were declared first.
//! 3. **Soft-fail writes**: `put_*` returns a `PutOutcome`, never an error, so
//!    batch computation over many entities does not stop on one bad entity.
//! 4. **Absence is a value**: a feature never written is `None`, not zero, and
//!    stays distinguishable all the way through aggregation.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use track_features::{
//!     Dimension, EntityKind, FeatureDeclaration, FeatureModel, MemoryTopology, TrackId, Universe,
//! };
//!
//! # fn main() -> track_features::Result<()> {
//! let topology = Arc::new(MemoryTopology::new());
//! topology.add_track(TrackId(1));
//! topology.add_track(TrackId(2));
//!
//! let model = FeatureModel::new(topology.clone());
//! model.declare(
//!     EntityKind::Track,
//!     &FeatureDeclaration::new().feature("SPEED", "Mean Speed", "V", Dimension::Velocity),
//! )?;
//!
//! assert!(model.put_track_feature(TrackId(1), "SPEED", 3.5).is_stored());
//!
//! let values = model.track_feature_values("SPEED", Universe::All)?;
//! assert_eq!(values[0], 3.5);
//! assert!(track_features::is_missing(values[1]));
//! # Ok(())
//! # }
//! ```
//!
//! ## Caller contract
//!
//! Declarations and clears are administrative operations meant to run
//! between pipeline stages. A `clear` issued while workers are still writing
//! the same namespace is not an error, but which of those writes survive is
//! unspecified.

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod registry;
pub mod store;
pub mod aggregate;
pub mod topology;
pub mod analyzer;
pub mod config;
pub mod export;

use std::sync::Arc;

use hashbrown::HashMap;

// ============================================================================
// Re-exports
// ============================================================================

pub use model::{
    TrackId, EdgeId, SpotId, Edge, Dimension,
    EntityKind, MetadataField, FeatureMetadata, FeatureDeclaration, Universe,
};
pub use registry::{FeatureRegistry, Namespace};
pub use store::{PutOutcome, ValueStore};
pub use aggregate::{MISSING, is_missing};
pub use topology::{TrackTopology, MemoryTopology};
pub use analyzer::{FeatureAnalyzer, TrackFeatureComputer, EdgeFeatureComputer};
pub use config::{FeatureModelConfig, StalePolicy};
pub use export::{FeatureTable, FeatureColumn, FeatureRow};

// ============================================================================
// FeatureModel
// ============================================================================

/// The primary entry point: feature registry and value stores bound to one
/// track topology.
///
/// All methods take `&self`; share the model between workers with an `Arc`.
pub struct FeatureModel<T: TrackTopology + ?Sized> {
    topology: Arc<T>,
    registry: FeatureRegistry,
    tracks: ValueStore<TrackId>,
    edges: ValueStore<EdgeId>,
    config: FeatureModelConfig,
}

impl<T: TrackTopology + ?Sized> FeatureModel<T> {
    /// A model with default configuration.
    pub fn new(topology: Arc<T>) -> Self {
        Self {
            topology,
            registry: FeatureRegistry::new(),
            tracks: ValueStore::new(),
            edges: ValueStore::new(),
            config: FeatureModelConfig::default(),
        }
    }

    pub fn with_config(topology: Arc<T>, config: FeatureModelConfig) -> Result<Self> {
        config.validate()?;
        let (tracks, edges) = match config.shard_amount {
            Some(shards) => (
                ValueStore::with_capacity_and_shard_amount(config.initial_capacity, shards),
                ValueStore::with_capacity_and_shard_amount(config.initial_capacity, shards),
            ),
            None => (
                ValueStore::with_capacity(config.initial_capacity),
                ValueStore::with_capacity(config.initial_capacity),
            ),
        };
        Ok(Self {
            topology,
            registry: FeatureRegistry::new(),
            tracks,
            edges,
            config,
        })
    }

    pub fn topology(&self) -> &T {
        &self.topology
    }

    /// Declarations and snapshots. Clearing goes through [`Self::clear`].
    pub fn registry(&self) -> &FeatureRegistry {
        &self.registry
    }

    pub fn config(&self) -> &FeatureModelConfig {
        &self.config
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    /// Declare a batch of features for `kind`. All or nothing.
    pub fn declare(&self, kind: EntityKind, decl: &FeatureDeclaration) -> Result<()> {
        self.registry.declare(kind, decl)
    }

    /// Declare everything an analyzer advertises, in its namespace.
    pub fn declare_analyzer<A: FeatureAnalyzer + ?Sized>(&self, analyzer: &A) -> Result<()> {
        self.registry.declare(analyzer.kind(), &analyzer.declaration())
    }

    /// Reset a namespace: declarations, metadata and every stored value.
    ///
    /// Holds the namespace write lock while values are dropped, so no put
    /// that saw the old declarations can land after the clear.
    pub fn clear(&self, kind: EntityKind) {
        let mut ns = self.registry.write(kind);
        let dropped = match kind {
            EntityKind::Track => {
                let n = self.tracks.len();
                self.tracks.clear();
                n
            }
            EntityKind::Edge => {
                let n = self.edges.len();
                self.edges.clear();
                n
            }
            EntityKind::Spot => 0,
        };
        let declared = ns.len();
        ns.reset();
        tracing::debug!(%kind, declared, dropped_entities = dropped, "cleared feature namespace");
    }

    /// Declared keys of `kind`, in first-declaration order.
    pub fn features(&self, kind: EntityKind) -> Vec<String> {
        self.registry.features(kind)
    }

    pub fn feature_names(&self, kind: EntityKind) -> HashMap<String, String> {
        self.registry.feature_names(kind)
    }

    pub fn feature_short_names(&self, kind: EntityKind) -> HashMap<String, String> {
        self.registry.feature_short_names(kind)
    }

    pub fn feature_dimensions(&self, kind: EntityKind) -> HashMap<String, Dimension> {
        self.registry.feature_dimensions(kind)
    }

    pub fn metadata(&self, kind: EntityKind, key: &str) -> Option<FeatureMetadata> {
        self.registry.metadata(kind, key)
    }

    pub fn contains_feature(&self, kind: EntityKind, key: &str) -> bool {
        self.registry.contains(kind, key)
    }

    // ========================================================================
    // Track values
    // ========================================================================

    /// Store a track feature value.
    ///
    /// The track must be known to the topology and the key declared as a
    /// track feature; otherwise nothing is stored.
    pub fn put_track_feature(&self, track: TrackId, key: &str, value: f64) -> PutOutcome {
        if !self.topology.contains_track(track) {
            tracing::trace!(%track, key, "track feature rejected: unknown track");
            return PutOutcome::UnknownEntity;
        }
        let ns = self.registry.read(EntityKind::Track);
        if !ns.contains(key) {
            tracing::trace!(%track, key, "track feature rejected: undeclared key");
            return PutOutcome::UndeclaredFeature;
        }
        self.tracks.insert(track, key, value);
        PutOutcome::Stored
    }

    /// The stored value, or `None` if this track never got one for `key`.
    pub fn track_feature(&self, track: TrackId, key: &str) -> Option<f64> {
        self.tracks.get(track, key)
    }

    /// A detached copy of every value stored for `track`.
    pub fn track_values(&self, track: TrackId) -> HashMap<String, f64> {
        self.tracks.entity_values(track).unwrap_or_default()
    }

    /// Number of tracks with at least one stored value.
    pub fn track_value_count(&self) -> usize {
        self.tracks.len()
    }

    // ========================================================================
    // Edge values
    // ========================================================================

    /// Store an edge feature value.
    ///
    /// The edge must currently be part of the topology and the key declared
    /// as an edge feature; otherwise nothing is stored.
    pub fn put_edge_feature(&self, edge: EdgeId, key: &str, value: f64) -> PutOutcome {
        if !self.topology.contains_edge(edge) {
            tracing::trace!(%edge, key, "edge feature rejected: unknown edge");
            return PutOutcome::UnknownEntity;
        }
        let ns = self.registry.read(EntityKind::Edge);
        if !ns.contains(key) {
            tracing::trace!(%edge, key, "edge feature rejected: undeclared key");
            return PutOutcome::UndeclaredFeature;
        }
        self.edges.insert(edge, key, value);
        PutOutcome::Stored
    }

    pub fn edge_feature(&self, edge: EdgeId, key: &str) -> Option<f64> {
        self.edges.get(edge, key)
    }

    pub fn edge_values(&self, edge: EdgeId) -> HashMap<String, f64> {
        self.edges.entity_values(edge).unwrap_or_default()
    }

    pub fn edge_value_count(&self) -> usize {
        self.edges.len()
    }

    // ========================================================================
    // Stale values
    // ========================================================================

    /// Eviction hook for the topology owner: a track (and the listed edges)
    /// left the topology.
    ///
    /// Only evicts under `StalePolicy::Evict`; with `Retain` the values stay
    /// until `prune_stale` or a clear. Returns the number of entities whose
    /// values were dropped.
    pub fn on_track_removed(&self, track: TrackId, removed_edges: &[EdgeId]) -> usize {
        if self.config.stale_values != StalePolicy::Evict {
            return 0;
        }
        let mut evicted = usize::from(self.tracks.remove_entity(track));
        evicted += removed_edges.iter()
            .filter(|e| self.edges.remove_entity(**e))
            .count();
        tracing::debug!(%track, evicted, "evicted values of removed track");
        evicted
    }

    /// Eviction hook for a single edge removal. See [`Self::on_track_removed`].
    pub fn on_edge_removed(&self, edge: EdgeId) -> bool {
        if self.config.stale_values != StalePolicy::Evict {
            return false;
        }
        let evicted = self.edges.remove_entity(edge);
        if evicted {
            tracing::debug!(%edge, "evicted values of removed edge");
        }
        evicted
    }

    /// Drop the values of every track and edge the topology no longer knows,
    /// whatever the stale policy. Returns the number of entities dropped.
    pub fn prune_stale(&self) -> usize {
        let tracks = self.tracks.retain_entities(|t| self.topology.contains_track(t));
        let edges = self.edges.retain_entities(|e| self.topology.contains_edge(e));
        tracing::debug!(tracks, edges, "pruned stale feature values");
        tracks + edges
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid {kind} feature declaration: feature {key} misses a {field}")]
    InvalidDeclaration {
        kind: EntityKind,
        key: String,
        field: MetadataField,
    },

    #[error("Unknown {kind} feature: {key}")]
    UnknownFeature { kind: EntityKind, key: String },

    #[error("{operation} is not supported for {kind} features")]
    UnsupportedKind { kind: EntityKind, operation: &'static str },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
