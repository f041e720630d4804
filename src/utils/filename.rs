use chrono::{Datelike, Local};
use std::path::PathBuf;

/// Default directory for exported map layers: exports/uhi-layers-{YYMMDD}
pub fn generate_default_export_dir() -> PathBuf {
    let now = Local::now();
    let year = now.year() % 100; // Last 2 digits of year

    PathBuf::from("exports").join(format!(
        "uhi-layers-{:02}{:02}{:02}",
        year,
        now.month(),
        now.day()
    ))
}

/// Default integrity report path: reports/uhi-report-{YYMMDD}.txt
pub fn generate_default_report_filename() -> PathBuf {
    let now = Local::now();
    let year = now.year() % 100;

    PathBuf::from("reports").join(format!(
        "uhi-report-{:02}{:02}{:02}.txt",
        year,
        now.month(),
        now.day()
    ))
}
