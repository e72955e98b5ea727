//! Feature registry.
//!
//! Bookkeeping of which feature keys exist per entity kind, and their name,
//! short name and dimension. One namespace per [`EntityKind`], each behind
//! its own `RwLock`.
//!
//! Declarations are additive: declaring a key again replaces its metadata,
//! declaring new keys extends the namespace. A declaration batch is checked
//! completely before anything is recorded, so a rejected batch leaves the
//! namespace untouched.

use hashbrown::HashMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::model::*;
use crate::{Error, Result};

// ============================================================================
// Namespace
// ============================================================================

/// The declared features of one entity kind.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    /// Declared keys, in first-declaration order.
    keys: Vec<String>,
    metadata: HashMap<String, FeatureMetadata>,
}

impl Namespace {
    pub fn contains(&self, key: &str) -> bool {
        self.metadata.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn metadata(&self, key: &str) -> Option<&FeatureMetadata> {
        self.metadata.get(key)
    }

    fn insert(&mut self, key: String, meta: FeatureMetadata) {
        if self.metadata.insert(key.clone(), meta).is_none() {
            self.keys.push(key);
        }
    }

    pub(crate) fn reset(&mut self) {
        self.keys.clear();
        self.metadata.clear();
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Resolve every key of `decl` to complete metadata, or report the first gap.
fn validate(kind: EntityKind, decl: &FeatureDeclaration) -> Result<Vec<(String, FeatureMetadata)>> {
    let missing = |key: &str, field| Error::InvalidDeclaration {
        kind,
        key: key.to_string(),
        field,
    };

    let mut resolved = Vec::with_capacity(decl.keys.len());
    for key in &decl.keys {
        let name = decl.names.get(key)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| missing(key.as_str(), MetadataField::Name))?;
        let short_name = decl.short_names.get(key)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| missing(key.as_str(), MetadataField::ShortName))?;
        let dimension = decl.dimensions.get(key)
            .ok_or_else(|| missing(key.as_str(), MetadataField::Dimension))?;

        resolved.push((key.clone(), FeatureMetadata::new(name.clone(), short_name.clone(), *dimension)));
    }
    Ok(resolved)
}

// ============================================================================
// FeatureRegistry
// ============================================================================

/// Declared features for spots, tracks and edges.
#[derive(Debug, Default)]
pub struct FeatureRegistry {
    spot: RwLock<Namespace>,
    track: RwLock<Namespace>,
    edge: RwLock<Namespace>,
}

impl FeatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self, kind: EntityKind) -> &RwLock<Namespace> {
        match kind {
            EntityKind::Spot => &self.spot,
            EntityKind::Track => &self.track,
            EntityKind::Edge => &self.edge,
        }
    }

    /// Hold the namespace read lock, e.g. across a check-then-store.
    pub(crate) fn read(&self, kind: EntityKind) -> RwLockReadGuard<'_, Namespace> {
        self.lock(kind).read()
    }

    /// Hold the namespace write lock, e.g. while dropping the values it governs.
    pub(crate) fn write(&self, kind: EntityKind) -> RwLockWriteGuard<'_, Namespace> {
        self.lock(kind).write()
    }

    /// Declare a batch of features.
    ///
    /// Fails with [`Error::InvalidDeclaration`] if any key lacks a name, a
    /// short name or a dimension, or has an empty name. Nothing is recorded
    /// in that case.
    pub fn declare(&self, kind: EntityKind, decl: &FeatureDeclaration) -> Result<()> {
        let resolved = match validate(kind, decl) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(%kind, error = %e, "rejected feature declaration");
                return Err(e);
            }
        };

        let mut ns = self.write(kind);
        for (key, meta) in resolved {
            ns.insert(key, meta);
        }
        tracing::debug!(%kind, declared = decl.len(), total = ns.len(), "declared features");
        Ok(())
    }

    pub fn contains(&self, kind: EntityKind, key: &str) -> bool {
        self.read(kind).contains(key)
    }

    pub fn metadata(&self, kind: EntityKind, key: &str) -> Option<FeatureMetadata> {
        self.read(kind).metadata(key).cloned()
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    /// Declared keys of `kind`, in first-declaration order.
    pub fn features(&self, kind: EntityKind) -> Vec<String> {
        self.read(kind).keys.clone()
    }

    pub fn feature_names(&self, kind: EntityKind) -> HashMap<String, String> {
        self.read(kind).metadata.iter()
            .map(|(k, m)| (k.clone(), m.name.clone()))
            .collect()
    }

    pub fn feature_short_names(&self, kind: EntityKind) -> HashMap<String, String> {
        self.read(kind).metadata.iter()
            .map(|(k, m)| (k.clone(), m.short_name.clone()))
            .collect()
    }

    pub fn feature_dimensions(&self, kind: EntityKind) -> HashMap<String, Dimension> {
        self.read(kind).metadata.iter()
            .map(|(k, m)| (k.clone(), m.dimension))
            .collect()
    }

    /// A detached copy of the whole namespace.
    pub fn snapshot(&self, kind: EntityKind) -> Namespace {
        self.read(kind).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn speed() -> FeatureDeclaration {
        FeatureDeclaration::new()
            .feature("SPEED", "Mean Speed", "V", Dimension::Velocity)
    }

    #[test]
    fn test_declare_and_read_back() {
        let reg = FeatureRegistry::new();
        reg.declare(EntityKind::Track, &speed()).unwrap();

        assert!(reg.contains(EntityKind::Track, "SPEED"));
        assert!(!reg.contains(EntityKind::Edge, "SPEED"));
        assert_eq!(reg.feature_names(EntityKind::Track)["SPEED"], "Mean Speed");
        assert_eq!(reg.feature_short_names(EntityKind::Track)["SPEED"], "V");
        assert_eq!(reg.feature_dimensions(EntityKind::Track)["SPEED"], Dimension::Velocity);
    }

    #[test]
    fn test_missing_dimension_rejects_whole_batch() {
        let reg = FeatureRegistry::new();
        let mut decl = speed().feature("DURATION", "Duration", "Dur", Dimension::Time);
        decl.dimensions.remove("DURATION");

        let err = reg.declare(EntityKind::Track, &decl).unwrap_err();
        match err {
            Error::InvalidDeclaration { key, field, .. } => {
                assert_eq!(key, "DURATION");
                assert_eq!(field, MetadataField::Dimension);
            }
            other => panic!("unexpected error: {other}"),
        }
        // SPEED was valid but must not have been recorded either.
        assert!(reg.features(EntityKind::Track).is_empty());
    }

    #[test]
    fn test_empty_short_name_is_rejected() {
        let reg = FeatureRegistry::new();
        let decl = FeatureDeclaration::new().feature("X", "Position X", "", Dimension::Position);
        assert!(matches!(
            reg.declare(EntityKind::Spot, &decl),
            Err(Error::InvalidDeclaration { field: MetadataField::ShortName, .. })
        ));
    }

    #[test]
    fn test_redeclare_keeps_order_and_updates_metadata() {
        let reg = FeatureRegistry::new();
        reg.declare(EntityKind::Edge, &speed()).unwrap();
        let superset = FeatureDeclaration::new()
            .feature("DISPLACEMENT", "Displacement", "Disp", Dimension::Length)
            .feature("SPEED", "Velocity", "V", Dimension::Velocity);
        reg.declare(EntityKind::Edge, &superset).unwrap();

        assert_eq!(reg.features(EntityKind::Edge), vec!["SPEED", "DISPLACEMENT"]);
        assert_eq!(reg.metadata(EntityKind::Edge, "SPEED").unwrap().name, "Velocity");
    }

    #[test]
    fn test_snapshots_are_detached() {
        let reg = FeatureRegistry::new();
        reg.declare(EntityKind::Track, &speed()).unwrap();

        let mut names = reg.feature_names(EntityKind::Track);
        names.insert("OTHER".into(), "Other".into());
        let mut keys = reg.features(EntityKind::Track);
        keys.clear();

        assert_eq!(reg.features(EntityKind::Track), vec!["SPEED"]);
        assert!(!reg.feature_names(EntityKind::Track).contains_key("OTHER"));
    }

    #[test]
    fn test_reset_is_per_namespace() {
        let reg = FeatureRegistry::new();
        reg.declare(EntityKind::Track, &speed()).unwrap();
        reg.declare(EntityKind::Edge, &speed()).unwrap();

        reg.write(EntityKind::Track).reset();
        assert!(reg.snapshot(EntityKind::Track).is_empty());
        assert!(reg.contains(EntityKind::Edge, "SPEED"));
    }
}
