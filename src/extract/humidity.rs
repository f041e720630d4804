use async_trait::async_trait;
use tracing::info;

use super::{assemble_series, Extract};
use crate::config::DateWindow;
use crate::error::Result;
use crate::models::{Grid, VariableKind, VariableTable};
use crate::remote::{EarthObservationService, Reducer, SeriesRequest};
use crate::utils::constants::{
    BAND_DEWPOINT_2M, BAND_TEMPERATURE_2M, DATASET_ERA5_DAILY, KELVIN_OFFSET, SCALE_ERA5_M,
};

// Magnus formula coefficients for saturation vapour pressure over water
const MAGNUS_A: f64 = 6.112;
const MAGNUS_B: f64 = 17.67;
const MAGNUS_C: f64 = 243.5;

/// Daily air temperature, dew point and derived relative humidity from
/// ERA5-Land. Relative humidity follows the Magnus approximation as the
/// ratio of vapour pressure at dew point to saturation vapour pressure.
pub struct HumidityExtractor;

impl HumidityExtractor {
    pub fn new() -> Self {
        Self
    }

    fn vapour_pressure(temp_c: f64) -> f64 {
        MAGNUS_A * ((MAGNUS_B * temp_c) / (temp_c + MAGNUS_C)).exp()
    }

    fn derive(inputs: &[f64]) -> Vec<f64> {
        let air_c = inputs[0] - KELVIN_OFFSET;
        let dew_c = inputs[1] - KELVIN_OFFSET;
        let relative_humidity =
            100.0 * Self::vapour_pressure(dew_c) / Self::vapour_pressure(air_c);
        vec![air_c, dew_c, relative_humidity]
    }
}

impl Default for HumidityExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Extract for HumidityExtractor {
    fn kind(&self) -> VariableKind {
        VariableKind::Humidity
    }

    async fn extract(
        &self,
        service: &dyn EarthObservationService,
        grid: &Grid,
        window: &DateWindow,
    ) -> Result<VariableTable> {
        let request = SeriesRequest {
            dataset: DATASET_ERA5_DAILY.to_string(),
            bands: vec![BAND_TEMPERATURE_2M.to_string(), BAND_DEWPOINT_2M.to_string()],
            reducer: Reducer::Mean,
            scale_m: SCALE_ERA5_M,
            window: window.clone(),
        };

        info!(
            "Extracting humidity over {} cells, {} days",
            grid.len(),
            window.num_days()
        );
        let stats = service.reduce_series(grid, &request).await?;

        assemble_series(
            self.kind(),
            grid,
            stats,
            &[BAND_TEMPERATURE_2M, BAND_DEWPOINT_2M],
            Self::derive,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturated_air_is_full_humidity() {
        // Dew point equal to air temperature means saturation
        let derived = HumidityExtractor::derive(&[298.15, 298.15]);
        assert!((derived[2] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_dry_air_below_saturation() {
        let derived = HumidityExtractor::derive(&[303.15, 288.15]);

        assert!((derived[0] - 30.0).abs() < 1e-9);
        assert!((derived[1] - 15.0).abs() < 1e-9);
        assert!(derived[2] > 0.0 && derived[2] < 100.0);
    }

    #[test]
    fn test_humidity_monotone_in_dew_point() {
        let drier = HumidityExtractor::derive(&[303.15, 283.15]);
        let wetter = HumidityExtractor::derive(&[303.15, 293.15]);
        assert!(wetter[2] > drier[2]);
    }
}
