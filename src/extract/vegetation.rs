use async_trait::async_trait;
use tracing::info;

use super::{assemble_series, Extract};
use crate::config::DateWindow;
use crate::error::Result;
use crate::models::{Grid, VariableKind, VariableTable};
use crate::remote::{EarthObservationService, Reducer, SeriesRequest};
use crate::utils::constants::{BAND_NDVI, DATASET_MODIS_NDVI, NDVI_SCALE_DIVISOR, SCALE_NDVI_M};

/// Vegetation index (NDVI) from the MODIS 16-day composites, rescaled
/// from the packed integer range to [-1, 1].
pub struct VegetationExtractor;

impl VegetationExtractor {
    pub fn new() -> Self {
        Self
    }

    fn derive(inputs: &[f64]) -> Vec<f64> {
        vec![inputs[0] / NDVI_SCALE_DIVISOR]
    }
}

impl Default for VegetationExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Extract for VegetationExtractor {
    fn kind(&self) -> VariableKind {
        VariableKind::Vegetation
    }

    async fn extract(
        &self,
        service: &dyn EarthObservationService,
        grid: &Grid,
        window: &DateWindow,
    ) -> Result<VariableTable> {
        let request = SeriesRequest {
            dataset: DATASET_MODIS_NDVI.to_string(),
            bands: vec![BAND_NDVI.to_string()],
            reducer: Reducer::Mean,
            scale_m: SCALE_NDVI_M,
            window: window.clone(),
        };

        info!(
            "Extracting vegetation index over {} cells, {} days",
            grid.len(),
            window.num_days()
        );
        let stats = service.reduce_series(grid, &request).await?;

        assemble_series(self.kind(), grid, stats, &[BAND_NDVI], Self::derive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_ndvi_rescaled() {
        let derived = VegetationExtractor::derive(&[4500.0]);
        assert!((derived[0] - 0.45).abs() < 1e-9);
    }

    #[test]
    fn test_negative_ndvi_preserved() {
        let derived = VegetationExtractor::derive(&[-2000.0]);
        assert!((derived[0] + 0.2).abs() < 1e-9);
    }
}
