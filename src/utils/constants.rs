/// Sentinel standing in for a missing observation in every artifact
pub const SENTINEL: f64 = -999.0;

/// Kilometres spanned by one degree of latitude
pub const KM_PER_DEG_LAT: f64 = 111.0;
/// Kilometres spanned by one degree of longitude at the study latitude (~19°N)
pub const KM_PER_DEG_LON: f64 = 102.0;

/// Default study area (Mumbai metropolitan region)
pub const DEFAULT_LAT_MIN: f64 = 18.847;
pub const DEFAULT_LON_MIN: f64 = 72.744;
pub const DEFAULT_LAT_MAX: f64 = 19.797;
pub const DEFAULT_LON_MAX: f64 = 73.712;
pub const DEFAULT_CELL_SIZE_KM: f64 = 5.0;

/// Extraction window defaults
pub const DEFAULT_WINDOW_DAYS: i64 = 365;
pub const DEFAULT_WINDOW_LAG_DAYS: i64 = 10;

/// Clustering defaults
pub const DEFAULT_CLUSTER_COUNT: usize = 5;
pub const DEFAULT_CLUSTER_SEED: u64 = 42;
pub const DEFAULT_MAX_ITERATIONS: u64 = 300;
pub const DEFAULT_TOLERANCE: f64 = 1e-4;

/// Remote dataset identifiers
pub const DATASET_ERA5_DAILY: &str = "ECMWF/ERA5_LAND/DAILY_AGGR";
pub const DATASET_MODIS_NDVI: &str = "MODIS/061/MOD13Q1";
pub const DATASET_WORLDCOVER: &str = "ESA/WorldCover/v100";

/// Band names within the remote datasets
pub const BAND_TEMPERATURE_2M: &str = "temperature_2m";
pub const BAND_DEWPOINT_2M: &str = "dewpoint_temperature_2m";
pub const BAND_PRECIPITATION: &str = "total_precipitation_sum";
pub const BAND_WIND_U: &str = "u_component_of_wind_10m";
pub const BAND_WIND_V: &str = "v_component_of_wind_10m";
pub const BAND_NDVI: &str = "NDVI";
pub const BAND_LANDCOVER: &str = "Map";

/// Reduction scales in metres
pub const SCALE_TEMPERATURE_M: u32 = 5000;
pub const SCALE_ERA5_M: u32 = 1000;
pub const SCALE_NDVI_M: u32 = 500;
pub const SCALE_LANDCOVER_M: u32 = 10;

/// WorldCover class code for built-up area
pub const LANDCOVER_BUILT_UP: u32 = 50;

pub const KELVIN_OFFSET: f64 = 273.15;
pub const NDVI_SCALE_DIVISOR: f64 = 10_000.0;
pub const METRES_TO_MM: f64 = 1000.0;

/// Store artifact names
pub const FILE_SURFACE_TEMP: &str = "AREA_LST.csv";
pub const FILE_VEGETATION: &str = "AREA_NDVI.csv";
pub const FILE_RAINFALL: &str = "AREA_RAINFALL.csv";
pub const FILE_WIND: &str = "AREA_WIND.csv";
pub const FILE_HUMIDITY: &str = "AREA_HUMIDITY.csv";
pub const FILE_IMPERVIOUS: &str = "AREA_ISA.csv";
pub const FILE_MERGED: &str = "Final_Merged_Dataset.csv";
pub const FILE_LABELED: &str = "Final_Merged_Dataset_with_UHI_Labels.csv";
pub const FILE_SNAPSHOT: &str = "latest_data.csv";
pub const FILE_CLUSTER_SUMMARY: &str = "Cluster_Summary.csv";

/// Value ranges used by the integrity checker and the override sliders
pub const MIN_VALID_TEMP_C: f64 = -10.0;
pub const MAX_VALID_TEMP_C: f64 = 50.0;
pub const MAX_VALID_RAINFALL_MM: f64 = 2000.0;
pub const MAX_VALID_WIND_MS: f64 = 15.0;

/// Temperature thresholds for the single-row quick severity rule
pub const QUICK_LABEL_LOW_MAX_C: f64 = 30.0;
pub const QUICK_LABEL_MODERATE_MAX_C: f64 = 35.0;

/// Processing defaults
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB
