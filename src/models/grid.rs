use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::StudyAreaConfig;
use crate::utils::constants::{KM_PER_DEG_LAT, KM_PER_DEG_LON};

/// Tiling parameters derived from the study area: origin, degree steps and
/// axis counts. Every stage that needs cell identity derives it from the
/// same spec, so one integer id means the same tile everywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub lat_min: f64,
    pub lon_min: f64,
    pub lat_step: f64,
    pub lon_step: f64,
    pub rows: u32,
    pub cols: u32,
}

impl GridSpec {
    pub fn from_study_area(area: &StudyAreaConfig) -> Self {
        let lat_step = area.cell_size_km / KM_PER_DEG_LAT;
        let lon_step = area.cell_size_km / KM_PER_DEG_LON;

        Self {
            lat_min: area.lat_min,
            lon_min: area.lon_min,
            lat_step,
            lon_step,
            rows: axis_count(area.lat_min, area.lat_max, lat_step),
            cols: axis_count(area.lon_min, area.lon_max, lon_step),
        }
    }

    pub fn cell_count(&self) -> u32 {
        self.rows * self.cols
    }
}

/// Cells per axis; counts the steps that start strictly inside the bound.
fn axis_count(min: f64, max: f64, step: f64) -> u32 {
    ((max - min) / step).ceil() as u32
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct GridCell {
    pub id: u32,
    pub row: u32,
    pub col: u32,

    #[validate(range(min = -90.0, max = 90.0))]
    pub lat_center: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub lon_center: f64,
}

/// Bounding rectangle of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellBounds {
    pub lat_min: f64,
    pub lon_min: f64,
    pub lat_max: f64,
    pub lon_max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    spec: GridSpec,
    cells: Vec<GridCell>,
}

impl Grid {
    /// Generate the ordered cell array. Row-major with longitude fastest:
    /// id = row * cols + col.
    pub fn generate(spec: GridSpec) -> Self {
        let mut cells = Vec::with_capacity(spec.cell_count() as usize);

        for row in 0..spec.rows {
            for col in 0..spec.cols {
                let id = row * spec.cols + col;
                cells.push(GridCell {
                    id,
                    row,
                    col,
                    lat_center: spec.lat_min + row as f64 * spec.lat_step + spec.lat_step / 2.0,
                    lon_center: spec.lon_min + col as f64 * spec.lon_step + spec.lon_step / 2.0,
                });
            }
        }

        Self { spec, cells }
    }

    pub fn from_study_area(area: &StudyAreaConfig) -> Self {
        Self::generate(GridSpec::from_study_area(area))
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    pub fn cell(&self, id: u32) -> Option<&GridCell> {
        self.cells.get(id as usize)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cell_bounds(&self, cell: &GridCell) -> CellBounds {
        let lat_min = self.spec.lat_min + cell.row as f64 * self.spec.lat_step;
        let lon_min = self.spec.lon_min + cell.col as f64 * self.spec.lon_step;

        CellBounds {
            lat_min,
            lon_min,
            lat_max: lat_min + self.spec.lat_step,
            lon_max: lon_min + self.spec.lon_step,
        }
    }
}
