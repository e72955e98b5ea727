//! End-to-end tests for values outliving topology changes.
//!
//! Tests the retain and evict stale-value policies, the eviction hooks,
//! pruning, track merges, and configuration loading.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use track_features::{
    Dimension, EntityKind, Error, FeatureDeclaration, FeatureModel, FeatureModelConfig,
    MemoryTopology, PutOutcome, SpotId, StalePolicy, TrackId, TrackTopology, Universe,
};

// ============================================================================
// Helper: two tracks with two edges each, values on everything.
// ============================================================================

fn setup(policy: StalePolicy) -> (Arc<MemoryTopology>, FeatureModel<MemoryTopology>) {
    let topo = Arc::new(MemoryTopology::new());
    for id in [1u32, 2] {
        topo.add_track(TrackId(id));
        topo.link(TrackId(id), SpotId(1), SpotId(2));
        topo.link(TrackId(id), SpotId(2), SpotId(3));
    }

    let config = FeatureModelConfig { stale_values: policy, shard_amount: Some(4), ..Default::default() };
    let model = FeatureModel::with_config(topo.clone(), config).unwrap();
    model.declare(
        EntityKind::Track,
        &FeatureDeclaration::new().feature("LENGTH", "Total distance", "Len", Dimension::Length),
    ).unwrap();
    model.declare(
        EntityKind::Edge,
        &FeatureDeclaration::new().feature("COST", "Link cost", "Cost", Dimension::None),
    ).unwrap();

    for track in topo.track_ids(false) {
        assert!(model.put_track_feature(track, "LENGTH", f64::from(track.0)).is_stored());
        for edge in topo.track_edges(track) {
            assert!(model.put_edge_feature(edge, "COST", 1.0).is_stored());
        }
    }
    (topo, model)
}

// ============================================================================
// 1. Retain: stale values survive until pruned
// ============================================================================

#[test]
fn test_retain_keeps_values_of_removed_track() {
    let (topo, model) = setup(StalePolicy::Retain);
    let removed = topo.remove_track(TrackId(2)).unwrap();

    assert_eq!(model.on_track_removed(TrackId(2), &removed), 0);
    assert_eq!(model.track_feature(TrackId(2), "LENGTH"), Some(2.0));
    assert_eq!(model.edge_feature(removed[0], "COST"), Some(1.0));

    // The stale entry is invisible to aggregation, which enumerates the topology.
    assert_eq!(model.track_feature_values("LENGTH", Universe::All).unwrap(), vec![1.0]);
    // But writes against the removed track are refused.
    assert_eq!(model.put_track_feature(TrackId(2), "LENGTH", 5.0), PutOutcome::UnknownEntity);
}

#[test]
fn test_prune_stale_drops_orphans() {
    let (topo, model) = setup(StalePolicy::Retain);
    topo.remove_track(TrackId(2));

    assert_eq!(model.prune_stale(), 3);
    assert_eq!(model.track_value_count(), 1);
    assert_eq!(model.edge_value_count(), 2);
    assert_eq!(model.prune_stale(), 0);
}

#[test]
fn test_pruned_track_rejects_puts() {
    let (topo, model) = setup(StalePolicy::Retain);
    topo.remove_track(TrackId(2));
    model.prune_stale();

    assert_eq!(model.put_track_feature(TrackId(2), "LENGTH", 7.0), PutOutcome::UnknownEntity);
    assert_eq!(model.track_feature(TrackId(2), "LENGTH"), None);
    assert!(model.put_track_feature(TrackId(1), "LENGTH", 7.0).is_stored());
    assert_eq!(model.track_value_count(), 1);
}

#[test]
fn test_retain_ignores_edge_removal_hook() {
    let (topo, model) = setup(StalePolicy::Retain);
    let edge = topo.track_edges(TrackId(1))[0];
    topo.remove_edge(edge);

    assert!(!model.on_edge_removed(edge));
    assert_eq!(model.edge_feature(edge, "COST"), Some(1.0));
    assert_eq!(model.edge_value_count(), 4);
    assert_eq!(model.edge_feature_values("COST", Universe::All).unwrap().len(), 3);
}

// ============================================================================
// 2. Evict: hooks drop values immediately
// ============================================================================

#[test]
fn test_evict_on_track_removal() {
    let (topo, model) = setup(StalePolicy::Evict);
    let removed = topo.remove_track(TrackId(1)).unwrap();

    assert_eq!(model.on_track_removed(TrackId(1), &removed), 3);
    assert_eq!(model.track_feature(TrackId(1), "LENGTH"), None);
    assert!(removed.iter().all(|e| model.edge_feature(*e, "COST").is_none()));
    assert_eq!(model.track_feature(TrackId(2), "LENGTH"), Some(2.0));
}

#[test]
fn test_evict_on_edge_removal() {
    let (topo, model) = setup(StalePolicy::Evict);
    let edge = topo.track_edges(TrackId(2))[1];
    topo.remove_edge(edge);

    assert!(model.on_edge_removed(edge));
    assert!(!model.on_edge_removed(edge));
    assert_eq!(model.edge_value_count(), 3);
}

// ============================================================================
// 3. Merges
// ============================================================================

#[test]
fn test_merge_keeps_edge_values_and_orphans_merged_track() {
    let (topo, model) = setup(StalePolicy::Evict);
    assert!(topo.merge_tracks(TrackId(1), TrackId(2)));
    model.on_track_removed(TrackId(2), &[]);

    // Edges moved with their identity, so their values follow them.
    let values = model.edge_feature_values("COST", Universe::All).unwrap();
    assert_eq!(values, vec![1.0; 4]);
    assert_eq!(model.track_feature(TrackId(2), "LENGTH"), None);
    assert_eq!(model.track_feature_values("LENGTH", Universe::All).unwrap(), vec![1.0]);
}

// ============================================================================
// 4. Configuration
// ============================================================================

#[test]
fn test_config_from_json() {
    let config = FeatureModelConfig::from_json(r#"{"stale_values": "evict", "initial_capacity": 128}"#).unwrap();
    let model = FeatureModel::with_config(Arc::new(MemoryTopology::new()), config).unwrap();
    assert_eq!(model.config().stale_values, StalePolicy::Evict);
    assert_eq!(model.config().initial_capacity, 128);
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = FeatureModelConfig { shard_amount: Some(3), ..Default::default() };
    let result = FeatureModel::with_config(Arc::new(MemoryTopology::new()), config);
    assert!(matches!(result, Err(Error::Config(_))));

    assert!(matches!(FeatureModelConfig::from_json("{\"stale_values\": 1}"), Err(Error::Json(_))));
}
