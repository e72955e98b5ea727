//! Aggregation of stored values into flat arrays.
//!
//! Plotting and filtering consumers want one `Vec<f64>` per feature, one
//! slot per entity of the chosen [`Universe`], in the topology's enumeration
//! order. Edges are flattened track by track, then in each track's edge order.
//!
//! Two kinds of "nothing" come out of here:
//!
//! - an entity without a value gets the [`MISSING`] placeholder (NaN) in its
//!   slot;
//! - a feature without a single value over the whole universe yields an
//!   empty vector, the "no data" signal. Consumers must tell it apart from
//!   an all-placeholder array, which this layer never returns.
//!
//! A value stored as NaN is indistinguishable from the placeholder in the
//! output, but still counts as data for the empty-vector rule.

use hashbrown::HashMap;

use crate::model::*;
use crate::topology::TrackTopology;
use crate::{Error, FeatureModel, Result};

/// Placeholder written in place of an absent value.
pub const MISSING: f64 = f64::NAN;

/// Whether an aggregated slot holds the placeholder.
pub fn is_missing(value: f64) -> bool {
    value.is_nan()
}

/// Lay values out slot by slot; an empty vector if none were present.
fn densify(values: impl Iterator<Item = Option<f64>>, capacity: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(capacity);
    let mut any = false;
    for value in values {
        match value {
            Some(v) => {
                any = true;
                out.push(v);
            }
            None => out.push(MISSING),
        }
    }
    if any { out } else { Vec::new() }
}

impl<T: TrackTopology + ?Sized> FeatureModel<T> {
    fn ensure_declared(&self, kind: EntityKind, key: &str) -> Result<()> {
        if self.registry.contains(kind, key) {
            Ok(())
        } else {
            Err(Error::UnknownFeature { kind, key: key.to_string() })
        }
    }

    /// Edges of the universe, flattened in track order.
    fn universe_edges(&self, universe: Universe) -> Vec<EdgeId> {
        self.topology.track_ids(universe.filtered_only())
            .into_iter()
            .flat_map(|track| self.topology.track_edges(track))
            .collect()
    }

    /// Values of one feature over the universe, for either value-bearing kind.
    ///
    /// Fails with [`Error::UnknownFeature`] for an undeclared key and with
    /// [`Error::UnsupportedKind`] for spots, whose values live elsewhere.
    pub fn feature_values(&self, kind: EntityKind, key: &str, universe: Universe) -> Result<Vec<f64>> {
        match kind {
            EntityKind::Track => self.track_feature_values(key, universe),
            EntityKind::Edge => self.edge_feature_values(key, universe),
            EntityKind::Spot => Err(Error::UnsupportedKind { kind, operation: "value aggregation" }),
        }
    }

    /// One slot per track of the universe.
    pub fn track_feature_values(&self, key: &str, universe: Universe) -> Result<Vec<f64>> {
        self.ensure_declared(EntityKind::Track, key)?;
        let tracks = self.topology.track_ids(universe.filtered_only());
        let values = densify(tracks.iter().map(|t| self.tracks.get(*t, key)), tracks.len());
        if values.is_empty() {
            tracing::debug!(key, ?universe, tracks = tracks.len(), "no data for track feature");
        }
        Ok(values)
    }

    /// One slot per edge of the universe's tracks.
    pub fn edge_feature_values(&self, key: &str, universe: Universe) -> Result<Vec<f64>> {
        self.ensure_declared(EntityKind::Edge, key)?;
        let edges = self.universe_edges(universe);
        let values = densify(edges.iter().map(|e| self.edges.get(*e, key)), edges.len());
        if values.is_empty() {
            tracing::debug!(key, ?universe, edges = edges.len(), "no data for edge feature");
        }
        Ok(values)
    }

    /// Arrays for every declared track feature, keyed by feature.
    ///
    /// Each array follows the same placeholder and no-data rules as
    /// [`Self::track_feature_values`].
    pub fn track_feature_table(&self, universe: Universe) -> HashMap<String, Vec<f64>> {
        let tracks = self.topology.track_ids(universe.filtered_only());
        self.registry.features(EntityKind::Track)
            .into_iter()
            .map(|key| {
                let values = densify(tracks.iter().map(|t| self.tracks.get(*t, &key)), tracks.len());
                (key, values)
            })
            .collect()
    }

    /// Arrays for every declared edge feature, keyed by feature.
    pub fn edge_feature_table(&self, universe: Universe) -> HashMap<String, Vec<f64>> {
        let edges = self.universe_edges(universe);
        self.registry.features(EntityKind::Edge)
            .into_iter()
            .map(|key| {
                let values = densify(edges.iter().map(|e| self.edges.get(*e, &key)), edges.len());
                (key, values)
            })
            .collect()
    }

    pub fn feature_table(&self, kind: EntityKind, universe: Universe) -> Result<HashMap<String, Vec<f64>>> {
        match kind {
            EntityKind::Track => Ok(self.track_feature_table(universe)),
            EntityKind::Edge => Ok(self.edge_feature_table(universe)),
            EntityKind::Spot => Err(Error::UnsupportedKind { kind, operation: "value aggregation" }),
        }
    }
}
