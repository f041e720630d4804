use async_trait::async_trait;
use tracing::info;

use super::Extract;
use crate::config::DateWindow;
use crate::error::{PipelineError, Result};
use crate::models::{Grid, ObservationRow, SampleKey, VariableKind, VariableTable};
use crate::remote::{EarthObservationService, Reducer, StaticRequest};
use crate::utils::constants::{
    BAND_LANDCOVER, DATASET_WORLDCOVER, LANDCOVER_BUILT_UP, SCALE_LANDCOVER_M, SENTINEL,
};

/// Impervious surface share from the ESA WorldCover map: the fraction of
/// built-up pixels in each cell, expressed as a percentage. The map has no
/// time dimension, so the per-cell value is repeated for every day of the
/// window to keep the table shape uniform with the daily families.
pub struct ImperviousExtractor;

impl ImperviousExtractor {
    pub fn new() -> Self {
        Self
    }

    fn to_percentage(fraction: Option<f64>) -> f64 {
        match fraction {
            Some(fraction) => fraction * 100.0,
            None => SENTINEL,
        }
    }
}

impl Default for ImperviousExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Extract for ImperviousExtractor {
    fn kind(&self) -> VariableKind {
        VariableKind::Impervious
    }

    async fn extract(
        &self,
        service: &dyn EarthObservationService,
        grid: &Grid,
        window: &DateWindow,
    ) -> Result<VariableTable> {
        let request = StaticRequest {
            dataset: DATASET_WORLDCOVER.to_string(),
            band: BAND_LANDCOVER.to_string(),
            reducer: Reducer::FractionEqual(LANDCOVER_BUILT_UP),
            scale_m: SCALE_LANDCOVER_M,
        };

        info!("Extracting impervious surface over {} cells", grid.len());
        let stats = service.reduce_static(grid, &request).await?;

        let mut per_cell = Vec::with_capacity(stats.len());
        for stat in stats {
            let cell = grid
                .cell(stat.grid_id)
                .ok_or(PipelineError::UnknownCell(stat.grid_id))?;
            per_cell.push((
                stat.grid_id,
                cell.lat_center,
                cell.lon_center,
                Self::to_percentage(stat.value),
            ));
        }

        let mut table = VariableTable::new(self.kind());
        for date in window.iter_days() {
            for &(grid_id, latitude, longitude, percentage) in &per_cell {
                table.push(ObservationRow {
                    key: SampleKey { date, grid_id },
                    latitude,
                    longitude,
                    values: vec![percentage],
                });
            }
        }

        table.sort();
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GridSpec;
    use crate::remote::{CellStat, SeriesRequest, SeriesStat};
    use chrono::NaiveDate;

    struct StaticOnlyService {
        stats: Vec<CellStat>,
    }

    #[async_trait]
    impl EarthObservationService for StaticOnlyService {
        async fn reduce_series(
            &self,
            _grid: &Grid,
            request: &SeriesRequest,
        ) -> Result<Vec<SeriesStat>> {
            Err(crate::error::PipelineError::RemoteQuery {
                dataset: request.dataset.clone(),
                message: "unexpected series query".to_string(),
            })
        }

        async fn reduce_static(
            &self,
            _grid: &Grid,
            _request: &StaticRequest,
        ) -> Result<Vec<CellStat>> {
            Ok(self.stats.clone())
        }
    }

    fn small_grid() -> Grid {
        Grid::generate(GridSpec {
            lat_min: 19.0,
            lon_min: 72.8,
            lat_step: 0.05,
            lon_step: 0.05,
            rows: 1,
            cols: 2,
        })
    }

    #[test]
    fn test_fraction_to_percentage() {
        assert_eq!(ImperviousExtractor::to_percentage(Some(0.42)), 42.0);
        assert_eq!(ImperviousExtractor::to_percentage(None), SENTINEL);
    }

    #[tokio::test]
    async fn test_static_value_expanded_across_window() {
        let grid = small_grid();
        let service = StaticOnlyService {
            stats: vec![
                CellStat {
                    grid_id: 0,
                    value: Some(0.25),
                },
                CellStat {
                    grid_id: 1,
                    value: None,
                },
            ],
        };
        let window = DateWindow {
            start: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 3, 4).unwrap(),
        };

        let table = ImperviousExtractor::new()
            .extract(&service, &grid, &window)
            .await
            .unwrap();

        // 3 days x 2 cells, same value on every day
        assert_eq!(table.len(), 6);
        assert!(table
            .rows
            .iter()
            .filter(|row| row.key.grid_id == 0)
            .all(|row| row.values[0] == 25.0));
        assert!(table
            .rows
            .iter()
            .filter(|row| row.key.grid_id == 1)
            .all(|row| row.values[0] == SENTINEL));
    }
}
