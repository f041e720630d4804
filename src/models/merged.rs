use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{PipelineError, Result};
use crate::models::label::SeverityLabel;
use crate::models::observation::SampleKey;

/// Feature columns in artifact and clustering order. Surface temperature
/// first; cluster ranking reads that position.
pub const FEATURE_COLUMNS: [&str; 9] = [
    "LST_Celsius",
    "NDVI",
    "Air_Temperature_C",
    "Dew_Point_Temperature_C",
    "Relative_Humidity_%",
    "WindDirection",
    "WindSpeed",
    "Rainfall_mm",
    "impervious_percentage",
];

/// Columns the labeled artifact appends after the feature columns.
pub const LABEL_COLUMNS: [&str; 2] = ["Cluster", "UHI_Label"];

/// One fully merged row: every variable resolved for one (date, cell).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct MergedRecord {
    pub date: NaiveDate,
    pub grid_id: u32,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,

    pub surface_temp_c: f64,
    pub vegetation_index: f64,
    pub air_temp_c: f64,
    pub dew_point_c: f64,
    pub relative_humidity: f64,
    pub wind_direction_deg: f64,
    pub wind_speed_ms: f64,
    pub rainfall_mm: f64,
    pub impervious_pct: f64,
}

impl MergedRecord {
    pub fn key(&self) -> SampleKey {
        SampleKey::new(self.date, self.grid_id)
    }

    /// Inverse of [`feature_values`](Self::feature_values): builds a record
    /// from values laid out in `FEATURE_COLUMNS` order.
    pub fn from_features(
        key: SampleKey,
        latitude: f64,
        longitude: f64,
        features: [f64; 9],
    ) -> Self {
        Self {
            date: key.date,
            grid_id: key.grid_id,
            latitude,
            longitude,
            surface_temp_c: features[0],
            vegetation_index: features[1],
            air_temp_c: features[2],
            dew_point_c: features[3],
            relative_humidity: features[4],
            wind_direction_deg: features[5],
            wind_speed_ms: features[6],
            rainfall_mm: features[7],
            impervious_pct: features[8],
        }
    }

    /// Values in `FEATURE_COLUMNS` order.
    pub fn feature_values(&self) -> [f64; 9] {
        [
            self.surface_temp_c,
            self.vegetation_index,
            self.air_temp_c,
            self.dew_point_c,
            self.relative_humidity,
            self.wind_direction_deg,
            self.wind_speed_ms,
            self.rainfall_mm,
            self.impervious_pct,
        ]
    }

    pub fn has_sentinel(&self, sentinel: f64) -> bool {
        self.feature_values().iter().any(|v| *v == sentinel)
    }
}

/// Row plus its batch clustering outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledRecord {
    pub record: MergedRecord,
    pub cluster: usize,
    pub label: SeverityLabel,
}

impl LabeledRecord {
    pub fn key(&self) -> SampleKey {
        self.record.key()
    }
}

/// Incremental assembly during the merge; `build` fails on any variable the
/// merger never filled in.
#[derive(Debug, Default)]
pub struct MergedRecordBuilder {
    date: Option<NaiveDate>,
    grid_id: Option<u32>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    surface_temp_c: Option<f64>,
    vegetation_index: Option<f64>,
    air_temp_c: Option<f64>,
    dew_point_c: Option<f64>,
    relative_humidity: Option<f64>,
    wind_direction_deg: Option<f64>,
    wind_speed_ms: Option<f64>,
    rainfall_mm: Option<f64>,
    impervious_pct: Option<f64>,
}

impl MergedRecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(mut self, key: SampleKey) -> Self {
        self.date = Some(key.date);
        self.grid_id = Some(key.grid_id);
        self
    }

    pub fn coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    pub fn surface_temp(mut self, value: f64) -> Self {
        self.surface_temp_c = Some(value);
        self
    }

    pub fn vegetation(mut self, value: f64) -> Self {
        self.vegetation_index = Some(value);
        self
    }

    pub fn humidity(mut self, air_temp_c: f64, dew_point_c: f64, relative_humidity: f64) -> Self {
        self.air_temp_c = Some(air_temp_c);
        self.dew_point_c = Some(dew_point_c);
        self.relative_humidity = Some(relative_humidity);
        self
    }

    pub fn wind(mut self, direction_deg: f64, speed_ms: f64) -> Self {
        self.wind_direction_deg = Some(direction_deg);
        self.wind_speed_ms = Some(speed_ms);
        self
    }

    pub fn rainfall(mut self, value: f64) -> Self {
        self.rainfall_mm = Some(value);
        self
    }

    pub fn impervious(mut self, value: f64) -> Self {
        self.impervious_pct = Some(value);
        self
    }

    pub fn build(self) -> Result<MergedRecord> {
        let missing = |field: &str| PipelineError::MissingData(field.to_string());

        Ok(MergedRecord {
            date: self.date.ok_or_else(|| missing("date"))?,
            grid_id: self.grid_id.ok_or_else(|| missing("grid_id"))?,
            latitude: self.latitude.ok_or_else(|| missing("latitude"))?,
            longitude: self.longitude.ok_or_else(|| missing("longitude"))?,
            surface_temp_c: self.surface_temp_c.ok_or_else(|| missing("surface_temp_c"))?,
            vegetation_index: self
                .vegetation_index
                .ok_or_else(|| missing("vegetation_index"))?,
            air_temp_c: self.air_temp_c.ok_or_else(|| missing("air_temp_c"))?,
            dew_point_c: self.dew_point_c.ok_or_else(|| missing("dew_point_c"))?,
            relative_humidity: self
                .relative_humidity
                .ok_or_else(|| missing("relative_humidity"))?,
            wind_direction_deg: self
                .wind_direction_deg
                .ok_or_else(|| missing("wind_direction_deg"))?,
            wind_speed_ms: self.wind_speed_ms.ok_or_else(|| missing("wind_speed_ms"))?,
            rainfall_mm: self.rainfall_mm.ok_or_else(|| missing("rainfall_mm"))?,
            impervious_pct: self
                .impervious_pct
                .ok_or_else(|| missing("impervious_pct"))?,
        })
    }
}
