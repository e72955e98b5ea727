//! Feature keys, metadata and declarations.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use super::Dimension;

// ============================================================================
// Entity kinds
// ============================================================================

/// The entity kind a feature namespace belongs to.
///
/// Each kind has its own key namespace: a track feature `"SPEED"` and an edge
/// feature `"SPEED"` are unrelated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Registry only. Spot values are stored on the spots themselves.
    Spot,
    Track,
    Edge,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Spot, EntityKind::Track, EntityKind::Edge];
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Spot => f.write_str("spot"),
            EntityKind::Track => f.write_str("track"),
            EntityKind::Edge => f.write_str("edge"),
        }
    }
}

/// One of the three mandatory metadata entries of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataField {
    Name,
    ShortName,
    Dimension,
}

impl std::fmt::Display for MetadataField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataField::Name => f.write_str("name"),
            MetadataField::ShortName => f.write_str("short name"),
            MetadataField::Dimension => f.write_str("dimension"),
        }
    }
}

// ============================================================================
// Metadata
// ============================================================================

/// Display metadata of one declared feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureMetadata {
    pub name: String,
    pub short_name: String,
    pub dimension: Dimension,
}

impl FeatureMetadata {
    pub fn new(name: impl Into<String>, short_name: impl Into<String>, dimension: Dimension) -> Self {
        Self { name: name.into(), short_name: short_name.into(), dimension }
    }
}

// ============================================================================
// Declarations
// ============================================================================

/// A batch of features to declare in one namespace.
///
/// Holds the key list and the three metadata maps separately, so a batch
/// assembled from independent sources can be incomplete. The registry checks
/// completeness and rejects the whole batch on the first gap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureDeclaration {
    pub keys: Vec<String>,
    pub names: HashMap<String, String>,
    pub short_names: HashMap<String, String>,
    pub dimensions: HashMap<String, Dimension>,
}

impl FeatureDeclaration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a declaration from a key list and separate metadata maps.
    pub fn from_parts(
        keys: impl IntoIterator<Item = impl Into<String>>,
        names: HashMap<String, String>,
        short_names: HashMap<String, String>,
        dimensions: HashMap<String, Dimension>,
    ) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            names,
            short_names,
            dimensions,
        }
    }

    /// Add one fully described feature.
    pub fn feature(
        mut self,
        key: impl Into<String>,
        name: impl Into<String>,
        short_name: impl Into<String>,
        dimension: Dimension,
    ) -> Self {
        let key = key.into();
        self.names.insert(key.clone(), name.into());
        self.short_names.insert(key.clone(), short_name.into());
        self.dimensions.insert(key.clone(), dimension);
        self.keys.push(key);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }
}

// ============================================================================
// Universe
// ============================================================================

/// Which entities an aggregation covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Universe {
    /// Every track the topology knows, and their edges.
    #[default]
    All,
    /// Only the tracks the topology currently marks as filtered, and their edges.
    Filtered,
}

impl Universe {
    pub fn filtered_only(&self) -> bool {
        matches!(self, Universe::Filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_fills_all_maps() {
        let decl = FeatureDeclaration::new()
            .feature("SPEED", "Mean Speed", "V", Dimension::Velocity)
            .feature("DURATION", "Duration", "Dur", Dimension::Time);

        assert_eq!(decl.len(), 2);
        for key in &decl.keys {
            assert!(decl.names.contains_key(key));
            assert!(decl.short_names.contains_key(key));
            assert!(decl.dimensions.contains_key(key));
        }
    }
}
