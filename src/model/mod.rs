//! # Feature Model Data
//!
//! Plain data types shared by the registry, the value store, the aggregation
//! layer and the topology contract.
//!
//! This module is pure data: no locks, no I/O, no topology access.

pub mod ids;
pub mod edge;
pub mod dimension;
pub mod feature;

pub use ids::{TrackId, EdgeId, SpotId};
pub use edge::Edge;
pub use dimension::Dimension;
pub use feature::{
    EntityKind, MetadataField, FeatureMetadata, FeatureDeclaration, Universe,
};
