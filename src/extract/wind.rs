use async_trait::async_trait;
use tracing::info;

use super::{assemble_series, Extract};
use crate::config::DateWindow;
use crate::error::Result;
use crate::models::{Grid, VariableKind, VariableTable};
use crate::remote::{EarthObservationService, Reducer, SeriesRequest};
use crate::utils::constants::{BAND_WIND_U, BAND_WIND_V, DATASET_ERA5_DAILY, SCALE_ERA5_M};

/// Daily 10 m wind from ERA5-Land. The u/v components are collapsed into
/// direction (degrees, atan2 convention) and scalar speed.
pub struct WindExtractor;

impl WindExtractor {
    pub fn new() -> Self {
        Self
    }

    fn derive(inputs: &[f64]) -> Vec<f64> {
        let (u, v) = (inputs[0], inputs[1]);
        let direction = v.atan2(u).to_degrees();
        let speed = u.hypot(v);
        vec![direction, speed]
    }
}

impl Default for WindExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Extract for WindExtractor {
    fn kind(&self) -> VariableKind {
        VariableKind::Wind
    }

    async fn extract(
        &self,
        service: &dyn EarthObservationService,
        grid: &Grid,
        window: &DateWindow,
    ) -> Result<VariableTable> {
        let request = SeriesRequest {
            dataset: DATASET_ERA5_DAILY.to_string(),
            bands: vec![BAND_WIND_U.to_string(), BAND_WIND_V.to_string()],
            reducer: Reducer::Mean,
            scale_m: SCALE_ERA5_M,
            window: window.clone(),
        };

        info!(
            "Extracting wind over {} cells, {} days",
            grid.len(),
            window.num_days()
        );
        let stats = service.reduce_series(grid, &request).await?;

        assemble_series(
            self.kind(),
            grid,
            stats,
            &[BAND_WIND_U, BAND_WIND_V],
            Self::derive,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_is_component_magnitude() {
        let derived = WindExtractor::derive(&[3.0, 4.0]);
        assert!((derived[1] - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_direction_from_components() {
        // Pure westerly flow (u > 0, v = 0) points along 0 degrees
        let derived = WindExtractor::derive(&[2.0, 0.0]);
        assert!(derived[0].abs() < 1e-9);

        // Pure southerly flow (u = 0, v > 0) points along 90 degrees
        let derived = WindExtractor::derive(&[0.0, 2.0]);
        assert!((derived[0] - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_calm_air() {
        let derived = WindExtractor::derive(&[0.0, 0.0]);
        assert_eq!(derived[1], 0.0);
    }
}
