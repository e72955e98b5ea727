//! Feature table export.
//!
//! Snapshots every declared feature of one namespace over a universe as a
//! table: one column per feature (with its metadata), one row per track or
//! edge. Written as JSON or CSV for reporting tools.
//!
//! ```text
//! FeatureModel → track_table(universe) → FeatureTable
//!   → write_json() / write_csv() → spreadsheet, notebook, plotting script
//! ```
//!
//! The JSON form carries the column metadata under `features` and one flat
//! object per entity under `rows`:
//!
//! ```text
//! {"kind": "track", "universe": "all",
//!  "features": [{"key": "SPEED", "name": "Mean Speed", "short_name": "V", "dimension": "VELOCITY"}],
//!  "rows": [{"track_id": 1, "SPEED": 3.5}, {"track_id": 2, "SPEED": null}]}
//! ```
//!
//! This is output only. Nothing here reads a table back into a model.

use std::io::Write;

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::model::*;
use crate::topology::TrackTopology;
use crate::{Error, FeatureModel, Result};

/// One exported feature and its metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureColumn {
    pub key: String,
    #[serde(flatten)]
    pub metadata: FeatureMetadata,
}

/// One exported entity. `values` is aligned with the table's columns;
/// absent values are `None` (`null` in JSON, an empty cell in CSV).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRow {
    pub track: TrackId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge: Option<EdgeId>,
    pub values: Vec<Option<f64>>,
}

/// A snapshot of one namespace's values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureTable {
    pub kind: EntityKind,
    pub universe: Universe,
    pub columns: Vec<FeatureColumn>,
    pub rows: Vec<FeatureRow>,
}

impl FeatureTable {
    /// Index of a feature's column.
    pub fn column_index(&self, key: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.key == key)
    }

    /// Every row's value for one feature.
    pub fn column(&self, key: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.column_index(key)?;
        Some(self.rows.iter().map(|r| r.values[idx]).collect())
    }

    /// JSON with a metadata header and one object per row, keyed by
    /// `track_id` (plus `edge_id` for edge tables) and the feature keys.
    pub fn write_json(&self, writer: impl Write) -> Result<()> {
        let rows: Vec<Value> = self.rows.iter().map(|row| self.row_object(row)).collect();
        let document = json!({
            "kind": self.kind,
            "universe": self.universe,
            "features": self.columns,
            "rows": rows,
        });
        serde_json::to_writer_pretty(writer, &document)?;
        Ok(())
    }

    fn row_object(&self, row: &FeatureRow) -> Value {
        let mut object = Map::with_capacity(self.columns.len() + 2);
        object.insert("track_id".into(), json!(row.track));
        if let Some(edge) = row.edge {
            object.insert("edge_id".into(), json!(edge));
        }
        for (column, value) in self.columns.iter().zip(&row.values) {
            object.insert(column.key.clone(), json!(value));
        }
        Value::Object(object)
    }

    /// CSV with a header of feature keys. Edge tables get an extra `EDGE_ID`
    /// column after `TRACK_ID`.
    pub fn write_csv(&self, mut writer: impl Write) -> Result<()> {
        let with_edge = self.kind == EntityKind::Edge;

        write!(writer, "TRACK_ID")?;
        if with_edge {
            write!(writer, ",EDGE_ID")?;
        }
        for column in &self.columns {
            write!(writer, ",{}", column.key)?;
        }
        writeln!(writer)?;

        for row in &self.rows {
            write!(writer, "{}", row.track)?;
            if with_edge {
                match row.edge {
                    Some(edge) => write!(writer, ",{}", edge.0)?,
                    None => write!(writer, ",")?,
                }
            }
            for value in &row.values {
                match value {
                    Some(v) => write!(writer, ",{v}")?,
                    None => write!(writer, ",")?,
                }
            }
            writeln!(writer)?;
        }
        Ok(())
    }
}

impl<T: TrackTopology + ?Sized> FeatureModel<T> {
    fn columns(&self, kind: EntityKind) -> Vec<FeatureColumn> {
        let ns = self.registry.snapshot(kind);
        ns.keys().iter()
            .filter_map(|key| {
                ns.metadata(key).map(|meta| FeatureColumn { key: key.clone(), metadata: meta.clone() })
            })
            .collect()
    }

    /// Every declared track feature, one row per track of the universe.
    pub fn track_table(&self, universe: Universe) -> FeatureTable {
        let columns = self.columns(EntityKind::Track);
        let rows = self.topology.track_ids(universe.filtered_only())
            .into_iter()
            .map(|track| FeatureRow {
                track,
                edge: None,
                values: columns.iter().map(|c| self.tracks.get(track, &c.key)).collect(),
            })
            .collect();
        FeatureTable { kind: EntityKind::Track, universe, columns, rows }
    }

    /// Every declared edge feature, one row per edge of the universe's tracks.
    pub fn edge_table(&self, universe: Universe) -> FeatureTable {
        let columns = self.columns(EntityKind::Edge);
        let mut rows = Vec::new();
        for track in self.topology.track_ids(universe.filtered_only()) {
            for edge in self.topology.track_edges(track) {
                rows.push(FeatureRow {
                    track,
                    edge: Some(edge),
                    values: columns.iter().map(|c| self.edges.get(edge, &c.key)).collect(),
                });
            }
        }
        FeatureTable { kind: EntityKind::Edge, universe, columns, rows }
    }

    pub fn table(&self, kind: EntityKind, universe: Universe) -> Result<FeatureTable> {
        match kind {
            EntityKind::Track => Ok(self.track_table(universe)),
            EntityKind::Edge => Ok(self.edge_table(universe)),
            EntityKind::Spot => Err(Error::UnsupportedKind { kind, operation: "table export" }),
        }
    }
}

/// Write every declared track feature over `universe` as JSON.
pub fn write_track_table_json<T: TrackTopology + ?Sized>(
    model: &FeatureModel<T>,
    universe: Universe,
    writer: impl Write,
) -> Result<()> {
    model.track_table(universe).write_json(writer)
}

/// Write every declared edge feature over `universe` as JSON.
pub fn write_edge_table_json<T: TrackTopology + ?Sized>(
    model: &FeatureModel<T>,
    universe: Universe,
    writer: impl Write,
) -> Result<()> {
    model.edge_table(universe).write_json(writer)
}
