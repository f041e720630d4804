use async_trait::async_trait;
use tracing::info;

use super::{assemble_series, Extract};
use crate::config::DateWindow;
use crate::error::Result;
use crate::models::{Grid, VariableKind, VariableTable};
use crate::remote::{EarthObservationService, Reducer, SeriesRequest};
use crate::utils::constants::{
    BAND_TEMPERATURE_2M, DATASET_ERA5_DAILY, KELVIN_OFFSET, SCALE_TEMPERATURE_M,
};

/// Daily 2 m surface temperature from the ERA5-Land daily aggregates,
/// converted from Kelvin to Celsius.
pub struct SurfaceTemperatureExtractor;

impl SurfaceTemperatureExtractor {
    pub fn new() -> Self {
        Self
    }

    fn derive(inputs: &[f64]) -> Vec<f64> {
        vec![inputs[0] - KELVIN_OFFSET]
    }
}

impl Default for SurfaceTemperatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Extract for SurfaceTemperatureExtractor {
    fn kind(&self) -> VariableKind {
        VariableKind::SurfaceTemperature
    }

    async fn extract(
        &self,
        service: &dyn EarthObservationService,
        grid: &Grid,
        window: &DateWindow,
    ) -> Result<VariableTable> {
        let request = SeriesRequest {
            dataset: DATASET_ERA5_DAILY.to_string(),
            bands: vec![BAND_TEMPERATURE_2M.to_string()],
            reducer: Reducer::Mean,
            scale_m: SCALE_TEMPERATURE_M,
            window: window.clone(),
        };

        info!(
            "Extracting surface temperature over {} cells, {} days",
            grid.len(),
            window.num_days()
        );
        let stats = service.reduce_series(grid, &request).await?;

        assemble_series(self.kind(), grid, stats, &[BAND_TEMPERATURE_2M], Self::derive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kelvin_to_celsius() {
        let derived = SurfaceTemperatureExtractor::derive(&[300.15]);
        assert!((derived[0] - 27.0).abs() < 1e-9);
    }

    #[test]
    fn test_freezing_point() {
        let derived = SurfaceTemperatureExtractor::derive(&[273.15]);
        assert!(derived[0].abs() < 1e-9);
    }
}
