use chrono::{Duration, NaiveDate, Utc};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

use crate::error::{PipelineError, Result};
use crate::utils::constants::*;

/// Shared run parameters for every pipeline stage. Constructed once in the
/// CLI layer and passed down; stages never read configuration themselves.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PipelineConfig {
    #[validate(nested)]
    pub study_area: StudyAreaConfig,

    #[validate(nested)]
    pub window: WindowConfig,

    #[validate(nested)]
    pub cluster: ClusterConfig,

    pub service: ServiceConfig,

    pub store: StoreConfig,

    pub artifacts: ArtifactConfig,

    /// Placeholder written for missing observations
    pub sentinel: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StudyAreaConfig {
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat_min: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub lon_min: f64,

    #[validate(range(min = -90.0, max = 90.0))]
    pub lat_max: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub lon_max: f64,

    #[validate(range(min = 0.1, max = 100.0))]
    pub cell_size_km: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WindowConfig {
    #[validate(range(min = 1))]
    pub days: i64,

    #[validate(range(min = 0))]
    pub lag_days: i64,

    /// Fixed "today" for reproducible runs; wall clock when absent
    pub reference_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ClusterConfig {
    #[validate(range(min = 1))]
    pub count: usize,

    pub seed: u64,

    pub max_iterations: u64,

    pub tolerance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub endpoint: String,
    pub project: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Logical folder holding every artifact
    pub folder: PathBuf,
    /// When set, artifacts are fetched/pushed over HTTP instead of local disk
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    pub surface_temp: String,
    pub vegetation: String,
    pub rainfall: String,
    pub wind: String,
    pub humidity: String,
    pub impervious: String,
    pub merged: String,
    pub labeled: String,
    pub snapshot: String,
    pub cluster_summary: String,
}

/// Half-open date range [start, end) covered by one extraction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }

    pub fn iter_days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        let start = self.start;
        (0..self.num_days()).map(move |i| start + Duration::days(i))
    }
}

impl PipelineConfig {
    /// Layered load: built-in defaults, then an optional TOML file, then
    /// `UHI_`-prefixed environment variables (`UHI_CLUSTER__SEED=7`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = Config::try_from(&Self::default())?;

        let mut builder = Config::builder().add_source(defaults);
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let merged = builder
            .add_source(Environment::with_prefix("UHI").separator("__"))
            .build()?;

        let config: Self = merged.try_deserialize()?;
        config.ensure_valid()?;
        Ok(config)
    }

    pub fn ensure_valid(&self) -> Result<()> {
        self.validate()?;

        if self.study_area.lat_min >= self.study_area.lat_max {
            return Err(PipelineError::InvalidBounds(format!(
                "lat_min {} must be below lat_max {}",
                self.study_area.lat_min, self.study_area.lat_max
            )));
        }
        if self.study_area.lon_min >= self.study_area.lon_max {
            return Err(PipelineError::InvalidBounds(format!(
                "lon_min {} must be below lon_max {}",
                self.study_area.lon_min, self.study_area.lon_max
            )));
        }

        Ok(())
    }

    /// Trailing extraction window ending `lag_days` before the reference date.
    pub fn window(&self) -> DateWindow {
        let today = self
            .window
            .reference_date
            .unwrap_or_else(|| Utc::now().date_naive());
        let end = today - Duration::days(self.window.lag_days);
        DateWindow {
            start: end - Duration::days(self.window.days),
            end,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            study_area: StudyAreaConfig::default(),
            window: WindowConfig::default(),
            cluster: ClusterConfig::default(),
            service: ServiceConfig::default(),
            store: StoreConfig::default(),
            artifacts: ArtifactConfig::default(),
            sentinel: SENTINEL,
        }
    }
}

impl Default for StudyAreaConfig {
    fn default() -> Self {
        Self {
            lat_min: DEFAULT_LAT_MIN,
            lon_min: DEFAULT_LON_MIN,
            lat_max: DEFAULT_LAT_MAX,
            lon_max: DEFAULT_LON_MAX,
            cell_size_km: DEFAULT_CELL_SIZE_KM,
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            days: DEFAULT_WINDOW_DAYS,
            lag_days: DEFAULT_WINDOW_LAG_DAYS,
            reference_date: None,
        }
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            count: DEFAULT_CLUSTER_COUNT,
            seed: DEFAULT_CLUSTER_SEED,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://earthengine.googleapis.com/v1".to_string(),
            project: "heat-islands".to_string(),
            timeout_secs: 300,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("EarthEngine"),
            base_url: None,
        }
    }
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            surface_temp: FILE_SURFACE_TEMP.to_string(),
            vegetation: FILE_VEGETATION.to_string(),
            rainfall: FILE_RAINFALL.to_string(),
            wind: FILE_WIND.to_string(),
            humidity: FILE_HUMIDITY.to_string(),
            impervious: FILE_IMPERVIOUS.to_string(),
            merged: FILE_MERGED.to_string(),
            labeled: FILE_LABELED.to_string(),
            snapshot: FILE_SNAPSHOT.to_string(),
            cluster_summary: FILE_CLUSTER_SUMMARY.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.ensure_valid().is_ok());
        assert_eq!(config.sentinel, -999.0);
        assert_eq!(config.cluster.count, 5);
    }

    #[test]
    fn test_window_from_reference_date() {
        let mut config = PipelineConfig::default();
        config.window.reference_date = NaiveDate::from_ymd_opt(2025, 3, 21);

        let window = config.window();
        assert_eq!(window.end, NaiveDate::from_ymd_opt(2025, 3, 11).unwrap());
        assert_eq!(window.num_days(), 365);
        assert!(window.contains(window.start));
        assert!(!window.contains(window.end));
    }

    #[test]
    fn test_window_day_iteration() {
        let window = DateWindow {
            start: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 1, 4).unwrap(),
        };

        let days: Vec<NaiveDate> = window.iter_days().collect();
        assert_eq!(days.len(), 3);
        assert_eq!(days[0], window.start);
        assert_eq!(days[2], NaiveDate::from_ymd_opt(2025, 1, 3).unwrap());
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let mut config = PipelineConfig::default();
        config.study_area.lat_min = 20.0;
        config.study_area.lat_max = 19.0;

        assert!(config.ensure_valid().is_err());
    }
}
