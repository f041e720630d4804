pub mod constants;
pub mod coordinates;
pub mod filename;
pub mod progress;

pub use constants::*;
pub use coordinates::{extent_km, haversine_distance};
pub use filename::{generate_default_export_dir, generate_default_report_filename};
pub use progress::ProgressReporter;
