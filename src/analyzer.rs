//! Feature analyzers.
//!
//! A pipeline stage that produces features advertises them through
//! [`FeatureAnalyzer`]: the keys it computes plus their names, short names
//! and dimensions, one map each. `FeatureModel::declare_analyzer` turns that
//! into a declaration.
//!
//! Stages that write track or edge values also implement
//! [`TrackFeatureComputer`] or [`EdgeFeatureComputer`]. The computation
//! itself stays outside this crate; the model only routes the results into
//! the store.

use hashbrown::HashMap;

use crate::model::*;
use crate::topology::TrackTopology;
use crate::{Error, FeatureModel, Result};

/// Something that knows which features it produces.
///
/// Keys are conventionally upper snake case (`POSITION_X`,
/// `TRACK_MEAN_SPEED`) so they can double as attribute names in exports.
pub trait FeatureAnalyzer {
    /// The namespace the features belong to.
    fn kind(&self) -> EntityKind;

    fn features(&self) -> Vec<String>;

    fn feature_names(&self) -> HashMap<String, String>;

    fn feature_short_names(&self) -> HashMap<String, String>;

    fn feature_dimensions(&self) -> HashMap<String, Dimension>;

    /// Everything the analyzer advertises, as one declaration batch.
    fn declaration(&self) -> FeatureDeclaration {
        FeatureDeclaration::from_parts(
            self.features(),
            self.feature_names(),
            self.feature_short_names(),
            self.feature_dimensions(),
        )
    }
}

/// Computes track feature values, one track at a time.
///
/// `compute` may be called from several threads at once.
pub trait TrackFeatureComputer: FeatureAnalyzer + Sync {
    /// Feature values for `track`. Keys not declared as track features are
    /// dropped by the model.
    fn compute(&self, track: TrackId, topology: &dyn TrackTopology) -> Vec<(String, f64)>;
}

/// Computes edge feature values, one edge at a time.
pub trait EdgeFeatureComputer: FeatureAnalyzer + Sync {
    fn compute(&self, track: TrackId, edge: EdgeId, topology: &dyn TrackTopology) -> Vec<(String, f64)>;
}

// ============================================================================
// Routing computed values into the model
// ============================================================================

impl<T: TrackTopology + ?Sized> FeatureModel<T> {
    /// Declare the computer's features, then compute and store them for
    /// every track of the universe. Returns the number of values stored.
    pub fn compute_tracks(&self, computer: &impl TrackFeatureComputer, universe: Universe) -> Result<usize> {
        if computer.kind() != EntityKind::Track {
            return Err(Error::UnsupportedKind { kind: computer.kind(), operation: "track computation" });
        }
        self.declare_analyzer(computer)?;

        let mut stored = 0;
        for track in self.topology.track_ids(universe.filtered_only()) {
            for (key, value) in computer.compute(track, &self.topology) {
                if self.put_track_feature(track, &key, value).is_stored() {
                    stored += 1;
                }
            }
        }
        tracing::debug!(stored, ?universe, "computed track features");
        Ok(stored)
    }

    /// Declare the computer's features, then compute and store them for
    /// every edge of the universe's tracks.
    pub fn compute_edges(&self, computer: &impl EdgeFeatureComputer, universe: Universe) -> Result<usize> {
        if computer.kind() != EntityKind::Edge {
            return Err(Error::UnsupportedKind { kind: computer.kind(), operation: "edge computation" });
        }
        self.declare_analyzer(computer)?;

        let mut stored = 0;
        for track in self.topology.track_ids(universe.filtered_only()) {
            for edge in self.topology.track_edges(track) {
                for (key, value) in computer.compute(track, edge, &self.topology) {
                    if self.put_edge_feature(edge, &key, value).is_stored() {
                        stored += 1;
                    }
                }
            }
        }
        tracing::debug!(stored, ?universe, "computed edge features");
        Ok(stored)
    }
}
