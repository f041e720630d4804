//! Extraction of per-cell variable tables from the remote service.
//!
//! Each variable family owns its dataset, bands, reducer scale and
//! derivation. All families share the same output shape: a keyed
//! [`VariableTable`] with one row per grid cell per day of the window
//! (the impervious-surface family is static and gets expanded across
//! the window so downstream joins stay uniform).

pub mod humidity;
pub mod impervious;
pub mod rainfall;
pub mod surface_temperature;
pub mod vegetation;
pub mod wind;

pub use humidity::HumidityExtractor;
pub use impervious::ImperviousExtractor;
pub use rainfall::RainfallExtractor;
pub use surface_temperature::SurfaceTemperatureExtractor;
pub use vegetation::VegetationExtractor;
pub use wind::WindExtractor;

use async_trait::async_trait;

use crate::config::DateWindow;
use crate::error::{PipelineError, Result};
use crate::models::{Grid, ObservationRow, SampleKey, VariableKind, VariableTable};
use crate::remote::{EarthObservationService, SeriesStat};
use crate::utils::constants::SENTINEL;

/// One variable family's extraction against the remote service.
#[async_trait]
pub trait Extract: Send + Sync {
    fn kind(&self) -> VariableKind;

    async fn extract(
        &self,
        service: &dyn EarthObservationService,
        grid: &Grid,
        window: &DateWindow,
    ) -> Result<VariableTable>;
}

pub fn extractor_for(kind: VariableKind) -> Box<dyn Extract> {
    match kind {
        VariableKind::SurfaceTemperature => Box::new(SurfaceTemperatureExtractor::new()),
        VariableKind::Vegetation => Box::new(VegetationExtractor::new()),
        VariableKind::Rainfall => Box::new(RainfallExtractor::new()),
        VariableKind::Wind => Box::new(WindExtractor::new()),
        VariableKind::Humidity => Box::new(HumidityExtractor::new()),
        VariableKind::Impervious => Box::new(ImperviousExtractor::new()),
    }
}

/// Turns raw per-cell daily statistics into a sorted table, running each
/// row through the family's derivation. A row with any contributing band
/// missing gets the sentinel in every output column.
fn assemble_series<F>(
    kind: VariableKind,
    grid: &Grid,
    stats: Vec<SeriesStat>,
    bands: &[&str],
    derive: F,
) -> Result<VariableTable>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let column_count = kind.columns().len();
    let mut table = VariableTable::new(kind);

    for stat in stats {
        let cell = grid
            .cell(stat.grid_id)
            .ok_or(PipelineError::UnknownCell(stat.grid_id))?;

        let mut inputs = Vec::with_capacity(bands.len());
        for band in bands {
            inputs.push(stat.values.get(*band).copied().flatten());
        }

        let values = if inputs.iter().any(Option::is_none) {
            vec![SENTINEL; column_count]
        } else {
            let inputs: Vec<f64> = inputs.into_iter().flatten().collect();
            derive(&inputs)
        };

        table.push(ObservationRow {
            key: SampleKey {
                date: stat.date,
                grid_id: stat.grid_id,
            },
            latitude: cell.lat_center,
            longitude: cell.lon_center,
            values,
        });
    }

    table.sort();
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GridSpec;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn small_grid() -> Grid {
        Grid::generate(GridSpec {
            lat_min: 19.0,
            lon_min: 72.8,
            lat_step: 0.05,
            lon_step: 0.05,
            rows: 2,
            cols: 2,
        })
    }

    fn stat(grid_id: u32, band: &str, value: Option<f64>) -> SeriesStat {
        let mut values = HashMap::new();
        values.insert(band.to_string(), value);
        SeriesStat {
            date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            grid_id,
            values,
        }
    }

    #[test]
    fn test_assemble_fills_sentinel_for_missing_band() {
        let grid = small_grid();
        let stats = vec![
            stat(0, "temperature_2m", Some(300.15)),
            stat(1, "temperature_2m", None),
        ];

        let table = assemble_series(
            VariableKind::SurfaceTemperature,
            &grid,
            stats,
            &["temperature_2m"],
            |values| vec![values[0] - 273.15],
        )
        .unwrap();

        assert_eq!(table.rows[0].values[0], 27.0);
        assert_eq!(table.rows[1].values[0], SENTINEL);
    }

    #[test]
    fn test_assemble_rejects_unknown_cell() {
        let grid = small_grid();
        let stats = vec![stat(99, "temperature_2m", Some(300.0))];

        let result = assemble_series(
            VariableKind::SurfaceTemperature,
            &grid,
            stats,
            &["temperature_2m"],
            |values| vec![values[0]],
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_assemble_sorts_by_key() {
        let grid = small_grid();
        let stats = vec![
            stat(3, "temperature_2m", Some(301.0)),
            stat(0, "temperature_2m", Some(300.0)),
        ];

        let table = assemble_series(
            VariableKind::SurfaceTemperature,
            &grid,
            stats,
            &["temperature_2m"],
            |values| vec![values[0]],
        )
        .unwrap();

        assert_eq!(table.rows[0].key.grid_id, 0);
        assert_eq!(table.rows[1].key.grid_id, 3);
    }

    #[test]
    fn test_extractor_for_covers_every_family() {
        for kind in VariableKind::ALL {
            assert_eq!(extractor_for(kind).kind(), kind);
        }
    }
}
