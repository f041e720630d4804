use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ArtifactConfig;
use crate::error::{PipelineError, Result};

/// Primary identity of a daily observation: (date, grid cell).
/// Serialized in artifacts as a composite `YYYYMMDD_<grid id>` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SampleKey {
    pub date: NaiveDate,
    pub grid_id: u32,
}

impl SampleKey {
    pub fn new(date: NaiveDate, grid_id: u32) -> Self {
        Self { date, grid_id }
    }

    pub fn encode(&self) -> String {
        format!("{}_{}", self.date.format("%Y%m%d"), self.grid_id)
    }

    pub fn parse(s: &str) -> Result<Self> {
        let (date_part, grid_part) = s
            .split_once('_')
            .ok_or_else(|| PipelineError::InvalidKey(s.to_string()))?;

        let date = NaiveDate::parse_from_str(date_part, "%Y%m%d")
            .map_err(|_| PipelineError::InvalidKey(s.to_string()))?;
        let grid_id = grid_part
            .parse::<u32>()
            .map_err(|_| PipelineError::InvalidKey(s.to_string()))?;

        Ok(Self { date, grid_id })
    }
}

impl fmt::Display for SampleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// The six extracted variable families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariableKind {
    SurfaceTemperature,
    Vegetation,
    Rainfall,
    Wind,
    Humidity,
    Impervious,
}

impl VariableKind {
    pub const ALL: [VariableKind; 6] = [
        VariableKind::SurfaceTemperature,
        VariableKind::Vegetation,
        VariableKind::Rainfall,
        VariableKind::Wind,
        VariableKind::Humidity,
        VariableKind::Impervious,
    ];

    /// Value columns this family contributes to its artifact.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            VariableKind::SurfaceTemperature => &["LST_Celsius"],
            VariableKind::Vegetation => &["NDVI"],
            VariableKind::Rainfall => &["Rainfall_mm"],
            VariableKind::Wind => &["WindDirection", "WindSpeed"],
            VariableKind::Humidity => &[
                "Air_Temperature_C",
                "Dew_Point_Temperature_C",
                "Relative_Humidity_%",
            ],
            VariableKind::Impervious => &["impervious_percentage"],
        }
    }

    pub fn artifact<'a>(&self, names: &'a ArtifactConfig) -> &'a str {
        match self {
            VariableKind::SurfaceTemperature => &names.surface_temp,
            VariableKind::Vegetation => &names.vegetation,
            VariableKind::Rainfall => &names.rainfall,
            VariableKind::Wind => &names.wind,
            VariableKind::Humidity => &names.humidity,
            VariableKind::Impervious => &names.impervious,
        }
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VariableKind::SurfaceTemperature => "surface temperature",
            VariableKind::Vegetation => "vegetation index",
            VariableKind::Rainfall => "rainfall",
            VariableKind::Wind => "wind",
            VariableKind::Humidity => "humidity",
            VariableKind::Impervious => "impervious surface",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for VariableKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "lst" | "temperature" => Ok(VariableKind::SurfaceTemperature),
            "ndvi" | "vegetation" => Ok(VariableKind::Vegetation),
            "rainfall" => Ok(VariableKind::Rainfall),
            "wind" => Ok(VariableKind::Wind),
            "humidity" => Ok(VariableKind::Humidity),
            "isa" | "impervious" => Ok(VariableKind::Impervious),
            other => Err(PipelineError::InvalidFormat(format!(
                "Unknown variable family: '{}'",
                other
            ))),
        }
    }
}

/// Leading columns shared by every keyed CSV artifact.
pub const ARTIFACT_KEY_COLUMNS: [&str; 4] = ["key", "Date", "Lat", "Lon"];

/// One observation row: key, cell center and the family's value columns,
/// aligned with `VariableTable::columns`. Missing values carry the sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRow {
    pub key: SampleKey,
    pub latitude: f64,
    pub longitude: f64,
    pub values: Vec<f64>,
}

/// Flat per-variable table, one row per (date, grid cell).
#[derive(Debug, Clone, PartialEq)]
pub struct VariableTable {
    pub kind: VariableKind,
    pub columns: Vec<String>,
    pub rows: Vec<ObservationRow>,
}

impl VariableTable {
    pub fn new(kind: VariableKind) -> Self {
        Self {
            kind,
            columns: kind.columns().iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: ObservationRow) {
        debug_assert_eq!(row.values.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Sort rows by key (date, then grid id) for stable artifacts.
    pub fn sort(&mut self) {
        self.rows.sort_by_key(|r| r.key);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
