//! GeoJSON overlay export.
//!
//! Renders the grid outline and the seven dashboard layers as GeoJSON
//! FeatureCollections for the browser map to draw. Styling rides on each
//! feature as a `style` property (Leaflet-style keys), value layers as cell
//! polygons colored from the layer palette, severity labels as points at the
//! cell centers colored from the shared label lookup.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

use crate::dashboard::LayerKind;
use crate::error::{PipelineError, Result};
use crate::models::{CellBounds, Grid};
use crate::processors::Snapshot;
use crate::utils::constants::{KM_PER_DEG_LAT, SENTINEL};

const GRID_OUTLINE_COLOR: &str = "black";
const TRANSPARENT_FILL: &str = "00000000";
const OUTLINE_WIDTH: u32 = 1;
const LABEL_MARKER_WIDTH: u32 = 10;

/// Top-level GeoJSON document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureCollection {
    /// Always "FeatureCollection".
    #[serde(rename = "type")]
    pub collection_type: String,

    /// Layer name shown in the map's layer control.
    pub name: String,

    pub features: Vec<MapFeature>,
}

impl FeatureCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            collection_type: "FeatureCollection".to_string(),
            name: name.into(),
            features: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapFeature {
    /// Always "Feature".
    #[serde(rename = "type")]
    pub feature_type: String,

    pub geometry: MapGeometry,

    pub properties: FeatureProperties,
}

impl MapFeature {
    pub fn new(geometry: MapGeometry, properties: FeatureProperties) -> Self {
        Self {
            feature_type: "Feature".to_string(),
            geometry,
            properties,
        }
    }
}

/// The two geometry shapes the overlays use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MapGeometry {
    Point { coordinates: [f64; 2] },
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
}

impl MapGeometry {
    /// Point at a cell center. GeoJSON orders coordinates [longitude,
    /// latitude].
    pub fn point(longitude: f64, latitude: f64) -> Self {
        MapGeometry::Point {
            coordinates: [longitude, latitude],
        }
    }

    /// Closed rectangular ring over one cell's bounds.
    pub fn rectangle(bounds: &CellBounds) -> Self {
        MapGeometry::Polygon {
            coordinates: vec![vec![
                [bounds.lon_min, bounds.lat_min],
                [bounds.lon_max, bounds.lat_min],
                [bounds.lon_max, bounds.lat_max],
                [bounds.lon_min, bounds.lat_max],
                [bounds.lon_min, bounds.lat_min],
            ]],
        }
    }
}

/// Per-feature drawing hints, Leaflet-style keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureStyle {
    pub color: String,
    pub fill_color: String,
    pub width: u32,
}

impl FeatureStyle {
    /// Outline and fill in one color.
    fn solid(color: &str, width: u32) -> Self {
        Self {
            color: color.to_string(),
            fill_color: color.to_string(),
            width,
        }
    }

    fn outline_only(color: &str, width: u32) -> Self {
        Self {
            color: color.to_string(),
            fill_color: TRANSPARENT_FILL.to_string(),
            width,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_id: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat_center: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon_center: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,

    #[serde(rename = "Cluster", skip_serializing_if = "Option::is_none")]
    pub cluster: Option<usize>,

    #[serde(rename = "UHI_Label", skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<FeatureStyle>,
}

pub struct GeoJsonWriter {
    sentinel: f64,
}

impl GeoJsonWriter {
    pub fn new() -> Self {
        Self { sentinel: SENTINEL }
    }

    pub fn with_sentinel(sentinel: f64) -> Self {
        Self { sentinel }
    }

    /// Grid outline overlay: one transparent rectangle per cell.
    pub fn grid_outline(&self, grid: &Grid) -> FeatureCollection {
        let size_km = (grid.spec().lat_step * KM_PER_DEG_LAT).round();
        let mut collection =
            FeatureCollection::new(format!("{}x{} km Grid Boxes", size_km, size_km));

        for cell in grid.cells() {
            let bounds = grid.cell_bounds(cell);
            collection.features.push(MapFeature::new(
                MapGeometry::rectangle(&bounds),
                FeatureProperties {
                    grid_id: Some(cell.id),
                    lat_center: Some(cell.lat_center),
                    lon_center: Some(cell.lon_center),
                    style: Some(FeatureStyle::outline_only(GRID_OUTLINE_COLOR, OUTLINE_WIDTH)),
                    ..FeatureProperties::default()
                },
            ));
        }

        collection
    }

    /// One dashboard layer over the snapshot.
    pub fn layer(
        &self,
        kind: LayerKind,
        snapshot: &Snapshot,
        grid: &Grid,
    ) -> Result<FeatureCollection> {
        match kind.style() {
            None => Ok(self.label_layer(snapshot)),
            Some(_) => self.value_layer(kind, snapshot, grid),
        }
    }

    pub fn write_grid_outline(&self, grid: &Grid, path: &Path) -> Result<()> {
        self.write(&self.grid_outline(grid), path)
    }

    pub fn write_layer(
        &self,
        kind: LayerKind,
        snapshot: &Snapshot,
        grid: &Grid,
        path: &Path,
    ) -> Result<()> {
        let collection = self.layer(kind, snapshot, grid)?;
        self.write(&collection, path)
    }

    fn label_layer(&self, snapshot: &Snapshot) -> FeatureCollection {
        let mut collection = FeatureCollection::new(LayerKind::SeverityLabels.display_name());

        for row in &snapshot.rows {
            let color = row.label.color();
            collection.features.push(MapFeature::new(
                MapGeometry::point(row.record.longitude, row.record.latitude),
                FeatureProperties {
                    grid_id: Some(row.record.grid_id),
                    cluster: Some(row.cluster),
                    label: Some(row.label.as_str().to_string()),
                    style: Some(FeatureStyle::solid(color, LABEL_MARKER_WIDTH)),
                    ..FeatureProperties::default()
                },
            ));
        }

        collection
    }

    fn value_layer(
        &self,
        kind: LayerKind,
        snapshot: &Snapshot,
        grid: &Grid,
    ) -> Result<FeatureCollection> {
        let style = kind.style().ok_or_else(|| {
            PipelineError::InvalidFormat(format!("{} is not a value layer", kind))
        })?;
        let mut collection = FeatureCollection::new(kind.display_name());

        for row in &snapshot.rows {
            // Missing observations are not drawn
            let Some(value) = kind.value(&row.record, self.sentinel) else {
                continue;
            };

            let cell = grid
                .cell(row.record.grid_id)
                .ok_or(PipelineError::UnknownCell(row.record.grid_id))?;
            let bounds = grid.cell_bounds(cell);

            collection.features.push(MapFeature::new(
                MapGeometry::rectangle(&bounds),
                FeatureProperties {
                    grid_id: Some(cell.id),
                    value: Some(value),
                    style: Some(FeatureStyle::solid(style.color_for(value), OUTLINE_WIDTH)),
                    ..FeatureProperties::default()
                },
            ));
        }

        Ok(collection)
    }

    fn write(&self, collection: &FeatureCollection, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer(BufWriter::new(file), collection)?;

        info!(
            "Wrote layer '{}' with {} features to {}",
            collection.name,
            collection.features.len(),
            path.display()
        );
        Ok(())
    }
}

impl Default for GeoJsonWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    use crate::config::StudyAreaConfig;
    use crate::models::{LabeledRecord, MergedRecordBuilder, SampleKey, SeverityLabel};

    fn grid() -> Grid {
        Grid::from_study_area(&StudyAreaConfig::default())
    }

    fn snapshot(grid: &Grid) -> Snapshot {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let rows = [(0u32, 28.0, SeverityLabel::Low), (1, 41.0, SeverityLabel::High)]
            .iter()
            .map(|(id, temp, label)| {
                let cell = grid.cell(*id).unwrap();
                LabeledRecord {
                    record: MergedRecordBuilder::new()
                        .key(SampleKey::new(date, *id))
                        .coordinates(cell.lat_center, cell.lon_center)
                        .surface_temp(*temp)
                        .vegetation(0.3)
                        .humidity(30.0, 22.0, 60.0)
                        .wind(100.0, 3.0)
                        .rainfall(1.0)
                        .impervious(70.0)
                        .build()
                        .unwrap(),
                    cluster: 0,
                    label: *label,
                }
            })
            .collect();
        Snapshot { date, rows }
    }

    #[test]
    fn test_grid_outline_covers_every_cell() {
        let grid = grid();
        let collection = GeoJsonWriter::new().grid_outline(&grid);

        assert_eq!(collection.name, "5x5 km Grid Boxes");
        assert_eq!(collection.features.len(), grid.len());

        let first = &collection.features[0];
        let MapGeometry::Polygon { coordinates } = &first.geometry else {
            panic!("grid cells are polygons");
        };
        // Closed ring
        assert_eq!(coordinates[0].first(), coordinates[0].last());
        assert_eq!(
            first.properties.style.as_ref().unwrap().fill_color,
            TRANSPARENT_FILL
        );
    }

    #[test]
    fn test_label_layer_points_and_colors() {
        let grid = grid();
        let snapshot = snapshot(&grid);
        let collection = GeoJsonWriter::new()
            .layer(LayerKind::SeverityLabels, &snapshot, &grid)
            .unwrap();

        assert_eq!(collection.name, "UHI Labels");
        assert_eq!(collection.features.len(), 2);

        let hot = &collection.features[1];
        assert_eq!(hot.properties.label.as_deref(), Some("High UHI"));
        assert_eq!(hot.properties.style.as_ref().unwrap().color, "yellow");
        assert!(matches!(hot.geometry, MapGeometry::Point { .. }));
    }

    #[test]
    fn test_value_layer_skips_missing_observations() {
        let grid = grid();
        let mut snapshot = snapshot(&grid);
        snapshot.rows[0].record.surface_temp_c = SENTINEL;

        let collection = GeoJsonWriter::new()
            .layer(LayerKind::SurfaceTemperature, &snapshot, &grid)
            .unwrap();

        assert_eq!(collection.name, "LST (°C)");
        assert_eq!(collection.features.len(), 1);
        assert_eq!(collection.features[0].properties.value, Some(41.0));
        // 41 C sits in the hot end of the temperature palette
        assert_eq!(
            collection.features[0].properties.style.as_ref().unwrap().color,
            "ff4f00"
        );
    }

    #[test]
    fn test_impervious_layer_exports_fractions() {
        let grid = grid();
        let snapshot = snapshot(&grid);

        let collection = GeoJsonWriter::new()
            .layer(LayerKind::Impervious, &snapshot, &grid)
            .unwrap();

        assert_eq!(collection.features[0].properties.value, Some(0.7));
        assert_eq!(
            collection.features[0].properties.style.as_ref().unwrap().color,
            "red"
        );
    }

    #[test]
    fn test_written_file_parses_back() {
        let grid = grid();
        let snapshot = snapshot(&grid);
        let dir = tempdir().unwrap();
        let path = dir.path().join("labels.geojson");

        GeoJsonWriter::new()
            .write_layer(LayerKind::SeverityLabels, &snapshot, &grid, &path)
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"type\":\"FeatureCollection\""));
        assert!(contents.contains("\"fillColor\""));

        let parsed: FeatureCollection = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed.features.len(), 2);
    }
}
