use async_trait::async_trait;
use tracing::info;

use super::{assemble_series, Extract};
use crate::config::DateWindow;
use crate::error::Result;
use crate::models::{Grid, VariableKind, VariableTable};
use crate::remote::{EarthObservationService, Reducer, SeriesRequest};
use crate::utils::constants::{BAND_PRECIPITATION, DATASET_ERA5_DAILY, METRES_TO_MM, SCALE_ERA5_M};

/// Daily total precipitation from ERA5-Land, converted from metres to
/// millimetres.
pub struct RainfallExtractor;

impl RainfallExtractor {
    pub fn new() -> Self {
        Self
    }

    fn derive(inputs: &[f64]) -> Vec<f64> {
        vec![inputs[0] * METRES_TO_MM]
    }
}

impl Default for RainfallExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Extract for RainfallExtractor {
    fn kind(&self) -> VariableKind {
        VariableKind::Rainfall
    }

    async fn extract(
        &self,
        service: &dyn EarthObservationService,
        grid: &Grid,
        window: &DateWindow,
    ) -> Result<VariableTable> {
        let request = SeriesRequest {
            dataset: DATASET_ERA5_DAILY.to_string(),
            bands: vec![BAND_PRECIPITATION.to_string()],
            reducer: Reducer::Mean,
            scale_m: SCALE_ERA5_M,
            window: window.clone(),
        };

        info!(
            "Extracting rainfall over {} cells, {} days",
            grid.len(),
            window.num_days()
        );
        let stats = service.reduce_series(grid, &request).await?;

        assemble_series(self.kind(), grid, stats, &[BAND_PRECIPITATION], Self::derive)
    }
}
