use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

use crate::error::Result;
use crate::models::{MergedRecord, SampleKey};
use crate::utils::constants::{
    MAX_VALID_RAINFALL_MM, MAX_VALID_TEMP_C, MAX_VALID_WIND_MS, MIN_VALID_TEMP_C, SENTINEL,
};

#[derive(Debug, Clone)]
pub struct IntegrityReport {
    pub total_records: usize,
    pub complete_records: usize,
    pub records_with_missing: usize,
    pub duplicate_keys: usize,
    pub distinct_dates: usize,
    pub sentinel_counts: HashMap<String, usize>,
    pub violations: Vec<RangeViolation>,
    pub cell_statistics: HashMap<u32, CellStatistics>,
}

#[derive(Debug, Clone)]
pub struct RangeViolation {
    pub grid_id: u32,
    pub date: NaiveDate,
    pub violation_type: ViolationType,
    pub details: String,
}

#[derive(Debug, Clone)]
pub enum ViolationType {
    OutOfRange,
    DuplicateKey,
}

#[derive(Debug, Clone, Default)]
pub struct CellStatistics {
    pub total_records: usize,
    pub complete_records: usize,
    pub min_surface_temp: Option<f64>,
    pub max_surface_temp: Option<f64>,
}

/// Data-quality checks over the merged dataset. Violations are reported,
/// never fatal: satellite-derived tables routinely carry a few rows of
/// sensor noise and the pipeline is expected to keep going.
pub struct IntegrityChecker {
    sentinel: f64,
}

impl IntegrityChecker {
    pub fn new() -> Self {
        Self { sentinel: SENTINEL }
    }

    pub fn with_sentinel(sentinel: f64) -> Self {
        Self { sentinel }
    }

    pub fn check(&self, records: &[MergedRecord]) -> Result<IntegrityReport> {
        let mut report = IntegrityReport {
            total_records: records.len(),
            complete_records: 0,
            records_with_missing: 0,
            duplicate_keys: 0,
            distinct_dates: 0,
            sentinel_counts: HashMap::new(),
            violations: Vec::new(),
            cell_statistics: HashMap::new(),
        };

        let mut seen_keys: HashSet<SampleKey> = HashSet::new();
        let mut dates: HashSet<NaiveDate> = HashSet::new();

        for record in records {
            dates.insert(record.date);

            if !seen_keys.insert(record.key()) {
                report.duplicate_keys += 1;
                report.violations.push(RangeViolation {
                    grid_id: record.grid_id,
                    date: record.date,
                    violation_type: ViolationType::DuplicateKey,
                    details: format!("key {} appears more than once", record.key()),
                });
            }

            self.check_record(record, &mut report);

            let stats = report.cell_statistics.entry(record.grid_id).or_default();
            stats.total_records += 1;
            if !record.has_sentinel(self.sentinel) {
                stats.complete_records += 1;
            }
            if record.surface_temp_c != self.sentinel {
                stats.min_surface_temp = Some(
                    stats
                        .min_surface_temp
                        .map_or(record.surface_temp_c, |t| t.min(record.surface_temp_c)),
                );
                stats.max_surface_temp = Some(
                    stats
                        .max_surface_temp
                        .map_or(record.surface_temp_c, |t| t.max(record.surface_temp_c)),
                );
            }
        }

        report.distinct_dates = dates.len();
        Ok(report)
    }

    fn check_record(&self, record: &MergedRecord, report: &mut IntegrityReport) {
        let mut missing = false;
        for (column, value) in crate::models::FEATURE_COLUMNS
            .iter()
            .zip(record.feature_values())
        {
            if value == self.sentinel {
                *report
                    .sentinel_counts
                    .entry(column.to_string())
                    .or_default() += 1;
                missing = true;
            }
        }

        if missing {
            report.records_with_missing += 1;
        } else {
            report.complete_records += 1;
        }

        let bounded = [
            (
                "LST_Celsius",
                record.surface_temp_c,
                MIN_VALID_TEMP_C,
                MAX_VALID_TEMP_C,
            ),
            (
                "Air_Temperature_C",
                record.air_temp_c,
                MIN_VALID_TEMP_C,
                MAX_VALID_TEMP_C,
            ),
            (
                "Dew_Point_Temperature_C",
                record.dew_point_c,
                MIN_VALID_TEMP_C,
                MAX_VALID_TEMP_C,
            ),
            ("NDVI", record.vegetation_index, -1.0, 1.0),
            ("Relative_Humidity_%", record.relative_humidity, 0.0, 100.0),
            ("WindSpeed", record.wind_speed_ms, 0.0, MAX_VALID_WIND_MS),
            ("Rainfall_mm", record.rainfall_mm, 0.0, MAX_VALID_RAINFALL_MM),
            ("impervious_percentage", record.impervious_pct, 0.0, 100.0),
        ];

        for (column, value, min, max) in bounded {
            if value != self.sentinel && !(min..=max).contains(&value) {
                report.violations.push(RangeViolation {
                    grid_id: record.grid_id,
                    date: record.date,
                    violation_type: ViolationType::OutOfRange,
                    details: format!(
                        "{} value {} is outside valid range [{}, {}]",
                        column, value, min, max
                    ),
                });
            }
        }
    }

    /// Generate a summary report
    pub fn generate_summary(&self, report: &IntegrityReport) -> String {
        let percent = |count: usize| {
            if report.total_records == 0 {
                0.0
            } else {
                100.0 * count as f64 / report.total_records as f64
            }
        };

        let mut summary = String::new();
        summary.push_str("=== Dataset Integrity Report ===\n");
        summary.push_str(&format!("Total Records: {}\n", report.total_records));
        summary.push_str(&format!(
            "Complete Records: {} ({:.1}%)\n",
            report.complete_records,
            percent(report.complete_records)
        ));
        summary.push_str(&format!(
            "Records With Missing Values: {} ({:.1}%)\n",
            report.records_with_missing,
            percent(report.records_with_missing)
        ));
        summary.push_str(&format!("Duplicate Keys: {}\n", report.duplicate_keys));
        summary.push_str(&format!("Distinct Dates: {}\n", report.distinct_dates));
        summary.push_str(&format!(
            "Cells Covered: {}\n",
            report.cell_statistics.len()
        ));

        if !report.sentinel_counts.is_empty() {
            summary.push_str("\nMissing Values Per Column:\n");
            let mut columns: Vec<_> = report.sentinel_counts.iter().collect();
            columns.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
            for (column, count) in columns {
                summary.push_str(&format!("  {}: {}\n", column, count));
            }
        }

        summary.push_str(&format!(
            "\nRange Violations: {}\n",
            report.violations.len()
        ));
        if !report.violations.is_empty() {
            summary.push_str("\nTop 10 Violations:\n");
            for (i, violation) in report.violations.iter().take(10).enumerate() {
                summary.push_str(&format!(
                    "  {}. Cell {} on {}: {}\n",
                    i + 1,
                    violation.grid_id,
                    violation.date,
                    violation.details
                ));
            }
        }

        summary
    }
}

impl Default for IntegrityChecker {
    fn default() -> Self {
        Self::new()
    }
}
