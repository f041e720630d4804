//! Map layer catalog.
//!
//! Seven fixed overlays: the six variables plus the batch severity labels.
//! Each value layer carries the visualization range and palette the map
//! draws with; cell values are clamped into the range and snapped to a
//! palette stop. The label layer takes its colors from
//! [`SeverityLabel::color`](crate::models::SeverityLabel::color) instead.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{PipelineError, Result};
use crate::models::MergedRecord;
use crate::utils::constants::{
    MAX_VALID_RAINFALL_MM, MAX_VALID_TEMP_C, MAX_VALID_WIND_MS, MIN_VALID_TEMP_C,
};

const PALETTE_TEMPERATURE: [&str; 7] = [
    "000080", "4000ff", "00ffff", "80ff00", "ffff00", "ff4f00", "ff00ff",
];
const PALETTE_VEGETATION: [&str; 2] = ["white", "green"];
const PALETTE_RAINFALL: [&str; 4] = ["lightblue", "blue", "darkblue", "purple"];
const PALETTE_HUMIDITY: [&str; 13] = [
    "white",
    "lightcyan",
    "lightskyblue",
    "deepskyblue",
    "cornflowerblue",
    "dodgerblue",
    "blue",
    "mediumblue",
    "darkblue",
    "indigo",
    "purple",
    "darkviolet",
    "blueviolet",
];
const PALETTE_IMPERVIOUS: [&str; 1] = ["red"];
const PALETTE_WIND: [&str; 4] = ["white", "skyblue", "blue", "navy"];

/// Visualization range and palette of one value layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerStyle {
    pub min: f64,
    pub max: f64,
    pub palette: &'static [&'static str],
}

impl LayerStyle {
    /// Position of `value` within the range, clamped to [0, 1].
    pub fn normalize(&self, value: f64) -> f64 {
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }

    /// Palette stop covering `value`.
    pub fn color_for(&self, value: f64) -> &'static str {
        let position = self.normalize(value) * self.palette.len() as f64;
        let index = (position as usize).min(self.palette.len() - 1);
        self.palette[index]
    }
}

/// One of the seven overlays the dashboard can draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerKind {
    SurfaceTemperature,
    Vegetation,
    Rainfall,
    Humidity,
    Impervious,
    WindSpeed,
    SeverityLabels,
}

impl LayerKind {
    pub const ALL: [LayerKind; 7] = [
        LayerKind::SurfaceTemperature,
        LayerKind::Vegetation,
        LayerKind::Rainfall,
        LayerKind::Humidity,
        LayerKind::Impervious,
        LayerKind::WindSpeed,
        LayerKind::SeverityLabels,
    ];

    /// Layer name shown on the map.
    pub fn display_name(&self) -> &'static str {
        match self {
            LayerKind::SurfaceTemperature => "LST (°C)",
            LayerKind::Vegetation => "NDVI",
            LayerKind::Rainfall => "Rainfall (mm)",
            LayerKind::Humidity => "Relative Humidity (%)",
            LayerKind::Impervious => "ISA (Built-up Area)",
            LayerKind::WindSpeed => "Wind Speed (m/s)",
            LayerKind::SeverityLabels => "UHI Labels",
        }
    }

    /// Short name used in selectors and export file names.
    pub fn slug(&self) -> &'static str {
        match self {
            LayerKind::SurfaceTemperature => "lst",
            LayerKind::Vegetation => "ndvi",
            LayerKind::Rainfall => "rainfall",
            LayerKind::Humidity => "humidity",
            LayerKind::Impervious => "isa",
            LayerKind::WindSpeed => "wind",
            LayerKind::SeverityLabels => "uhi",
        }
    }

    /// Range and palette; `None` for the label layer, which is colored per
    /// label rather than by value.
    pub fn style(&self) -> Option<LayerStyle> {
        let style = match self {
            LayerKind::SurfaceTemperature => LayerStyle {
                min: MIN_VALID_TEMP_C,
                max: MAX_VALID_TEMP_C,
                palette: &PALETTE_TEMPERATURE,
            },
            LayerKind::Vegetation => LayerStyle {
                min: 0.0,
                max: 1.0,
                palette: &PALETTE_VEGETATION,
            },
            LayerKind::Rainfall => LayerStyle {
                min: 0.0,
                max: MAX_VALID_RAINFALL_MM,
                palette: &PALETTE_RAINFALL,
            },
            LayerKind::Humidity => LayerStyle {
                min: 0.0,
                max: 100.0,
                palette: &PALETTE_HUMIDITY,
            },
            LayerKind::Impervious => LayerStyle {
                min: 0.0,
                max: 1.0,
                palette: &PALETTE_IMPERVIOUS,
            },
            LayerKind::WindSpeed => LayerStyle {
                min: 0.0,
                max: MAX_VALID_WIND_MS,
                palette: &PALETTE_WIND,
            },
            LayerKind::SeverityLabels => return None,
        };
        Some(style)
    }

    /// The record value this layer draws, in layer units. The impervious
    /// layer works in fractions while the artifact stores percentages.
    /// Returns `None` for the label layer and for missing observations.
    pub fn value(&self, record: &MergedRecord, sentinel: f64) -> Option<f64> {
        let raw = match self {
            LayerKind::SurfaceTemperature => record.surface_temp_c,
            LayerKind::Vegetation => record.vegetation_index,
            LayerKind::Rainfall => record.rainfall_mm,
            LayerKind::Humidity => record.relative_humidity,
            LayerKind::Impervious => record.impervious_pct,
            LayerKind::WindSpeed => record.wind_speed_ms,
            LayerKind::SeverityLabels => return None,
        };
        if raw == sentinel {
            return None;
        }

        Some(match self {
            LayerKind::Impervious => raw / 100.0,
            _ => raw,
        })
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for LayerKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "lst" | "temperature" => Ok(LayerKind::SurfaceTemperature),
            "ndvi" | "vegetation" => Ok(LayerKind::Vegetation),
            "rainfall" => Ok(LayerKind::Rainfall),
            "humidity" => Ok(LayerKind::Humidity),
            "isa" | "impervious" => Ok(LayerKind::Impervious),
            "wind" => Ok(LayerKind::WindSpeed),
            "uhi" | "labels" => Ok(LayerKind::SeverityLabels),
            other => Err(PipelineError::InvalidFormat(format!(
                "Unknown layer: '{}'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::models::{MergedRecordBuilder, SampleKey};
    use crate::utils::constants::SENTINEL;

    fn record() -> MergedRecord {
        MergedRecordBuilder::new()
            .key(SampleKey::new(
                NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                3,
            ))
            .coordinates(19.1, 72.9)
            .surface_temp(32.0)
            .vegetation(0.45)
            .humidity(30.0, 23.0, 64.0)
            .wind(140.0, 5.0)
            .rainfall(12.0)
            .impervious(55.0)
            .build()
            .unwrap()
    }

    #[test]
    fn test_every_value_layer_has_a_style() {
        for kind in LayerKind::ALL {
            match kind {
                LayerKind::SeverityLabels => assert!(kind.style().is_none()),
                _ => assert!(kind.style().is_some()),
            }
        }
    }

    #[test]
    fn test_temperature_palette_endpoints() {
        let style = LayerKind::SurfaceTemperature.style().unwrap();

        assert_eq!(style.color_for(-10.0), "000080");
        assert_eq!(style.color_for(50.0), "ff00ff");
        // Out-of-range values clamp to the ends
        assert_eq!(style.color_for(-40.0), "000080");
        assert_eq!(style.color_for(90.0), "ff00ff");
    }

    #[test]
    fn test_normalize_clamps() {
        let style = LayerKind::WindSpeed.style().unwrap();
        assert_eq!(style.normalize(-2.0), 0.0);
        assert_eq!(style.normalize(7.5), 0.5);
        assert_eq!(style.normalize(30.0), 1.0);
    }

    #[test]
    fn test_impervious_value_is_a_fraction() {
        let record = record();
        assert_eq!(
            LayerKind::Impervious.value(&record, SENTINEL),
            Some(0.55)
        );
        assert_eq!(
            LayerKind::SurfaceTemperature.value(&record, SENTINEL),
            Some(32.0)
        );
    }

    #[test]
    fn test_sentinel_value_is_missing() {
        let mut record = record();
        record.rainfall_mm = SENTINEL;

        assert_eq!(LayerKind::Rainfall.value(&record, SENTINEL), None);
        assert_eq!(LayerKind::SeverityLabels.value(&record, SENTINEL), None);
    }

    #[test]
    fn test_layer_names_parse() {
        assert_eq!(
            "LST".parse::<LayerKind>().unwrap(),
            LayerKind::SurfaceTemperature
        );
        assert_eq!("isa".parse::<LayerKind>().unwrap(), LayerKind::Impervious);
        assert_eq!(
            "labels".parse::<LayerKind>().unwrap(),
            LayerKind::SeverityLabels
        );
        assert!("thermal".parse::<LayerKind>().is_err());
    }

    #[test]
    fn test_slugs_parse_back() {
        for kind in LayerKind::ALL {
            assert_eq!(kind.slug().parse::<LayerKind>().unwrap(), kind);
        }
    }
}
