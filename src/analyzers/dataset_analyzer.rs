use chrono::NaiveDate;
use std::collections::HashSet;

use crate::error::{PipelineError, Result};
use crate::models::{LabeledRecord, SeverityLabel};
use crate::utils::constants::{MAX_VALID_TEMP_C, MIN_VALID_TEMP_C, SENTINEL};
use crate::utils::coordinates::extent_km;

/// Check if a surface temperature is usable for statistics
fn is_valid_temperature(temp: f64, sentinel: f64) -> bool {
    temp != sentinel && (MIN_VALID_TEMP_C..=MAX_VALID_TEMP_C).contains(&temp)
}

#[derive(Debug)]
pub struct DatasetStatistics {
    pub total_records: usize,
    pub unique_cells: usize,
    pub date_range: (NaiveDate, NaiveDate),
    pub temperature_stats: TemperatureStats,
    pub label_distribution: Vec<(SeverityLabel, usize)>,
    pub geographic_bounds: GeographicBounds,
}

#[derive(Debug)]
pub struct TemperatureStats {
    pub min_temp: f64,
    pub max_temp: f64,
    pub avg_temp: f64,
    pub min_temp_location: String,
    pub max_temp_location: String,
}

#[derive(Debug)]
pub struct GeographicBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl GeographicBounds {
    /// (north-south, east-west) extent in kilometres.
    pub fn extent_km(&self) -> (f64, f64) {
        extent_km(self.min_lat, self.min_lon, self.max_lat, self.max_lon)
    }
}

pub struct DatasetAnalyzer {
    sentinel: f64,
}

impl DatasetAnalyzer {
    pub fn new() -> Self {
        Self { sentinel: SENTINEL }
    }

    pub fn analyze(&self, records: &[LabeledRecord]) -> Result<DatasetStatistics> {
        if records.is_empty() {
            return Err(PipelineError::MissingData(
                "no records to analyze".to_string(),
            ));
        }

        let mut unique_cells = HashSet::new();
        let mut min_date = records[0].record.date;
        let mut max_date = records[0].record.date;
        let mut min_temp = f64::INFINITY;
        let mut max_temp = f64::NEG_INFINITY;
        let mut temp_sum = 0.0;
        let mut temp_count = 0usize;
        let mut min_temp_location = String::new();
        let mut max_temp_location = String::new();

        let mut label_counts = [0usize; SeverityLabel::ALL.len()];

        let mut min_lat = records[0].record.latitude;
        let mut max_lat = records[0].record.latitude;
        let mut min_lon = records[0].record.longitude;
        let mut max_lon = records[0].record.longitude;

        for labeled in records {
            let record = &labeled.record;
            unique_cells.insert(record.grid_id);

            if record.date < min_date {
                min_date = record.date;
            }
            if record.date > max_date {
                max_date = record.date;
            }

            if is_valid_temperature(record.surface_temp_c, self.sentinel) {
                if record.surface_temp_c < min_temp {
                    min_temp = record.surface_temp_c;
                    min_temp_location = format!("cell {} ({})", record.grid_id, record.date);
                }
                if record.surface_temp_c > max_temp {
                    max_temp = record.surface_temp_c;
                    max_temp_location = format!("cell {} ({})", record.grid_id, record.date);
                }
                temp_sum += record.surface_temp_c;
                temp_count += 1;
            }

            label_counts[labeled.label.vocabulary_index()] += 1;

            if record.latitude < min_lat {
                min_lat = record.latitude;
            }
            if record.latitude > max_lat {
                max_lat = record.latitude;
            }
            if record.longitude < min_lon {
                min_lon = record.longitude;
            }
            if record.longitude > max_lon {
                max_lon = record.longitude;
            }
        }

        let avg_temp = if temp_count > 0 {
            temp_sum / temp_count as f64
        } else {
            f64::NAN
        };

        if min_temp == f64::INFINITY {
            min_temp = f64::NAN;
            min_temp_location = "No valid measurements".to_string();
        }
        if max_temp == f64::NEG_INFINITY {
            max_temp = f64::NAN;
            max_temp_location = "No valid measurements".to_string();
        }

        let label_distribution = SeverityLabel::ALL
            .iter()
            .map(|label| (*label, label_counts[label.vocabulary_index()]))
            .collect();

        Ok(DatasetStatistics {
            total_records: records.len(),
            unique_cells: unique_cells.len(),
            date_range: (min_date, max_date),
            temperature_stats: TemperatureStats {
                min_temp,
                max_temp,
                avg_temp,
                min_temp_location,
                max_temp_location,
            },
            label_distribution,
            geographic_bounds: GeographicBounds {
                min_lat,
                max_lat,
                min_lon,
                max_lon,
            },
        })
    }
}

impl DatasetStatistics {
    pub fn summary(&self) -> String {
        let temp_range = if self.temperature_stats.min_temp.is_nan()
            || self.temperature_stats.max_temp.is_nan()
        {
            "No valid measurements".to_string()
        } else {
            format!(
                "{:.1}°C to {:.1}°C",
                self.temperature_stats.min_temp, self.temperature_stats.max_temp
            )
        };

        let labels = self
            .label_distribution
            .iter()
            .map(|(label, count)| format!("  - {}: {}", label, count))
            .collect::<Vec<_>>()
            .join("\n");

        let (north_south_km, east_west_km) = self.geographic_bounds.extent_km();

        format!(
            "Records: {} total\n\
            Grid Cells: {}\n\
            Date Range: {} to {} ({} days)\n\
            Surface Temperature: {}\n\
            Label Distribution:\n{}\n\
            Coverage: {:.3}°N-{:.3}°N, {:.3}°E-{:.3}°E (~{:.0} x {:.0} km)",
            self.total_records,
            self.unique_cells,
            self.date_range.0,
            self.date_range.1,
            self.date_range
                .1
                .signed_duration_since(self.date_range.0)
                .num_days()
                + 1,
            temp_range,
            labels,
            self.geographic_bounds.min_lat,
            self.geographic_bounds.max_lat,
            self.geographic_bounds.min_lon,
            self.geographic_bounds.max_lon,
            north_south_km,
            east_west_km
        )
    }

    pub fn detailed_summary(&self) -> String {
        let coldest = if self.temperature_stats.min_temp.is_nan() {
            "No valid measurements".to_string()
        } else {
            format!(
                "{:.1}°C at {}",
                self.temperature_stats.min_temp, self.temperature_stats.min_temp_location
            )
        };

        let hottest = if self.temperature_stats.max_temp.is_nan() {
            "No valid measurements".to_string()
        } else {
            format!(
                "{:.1}°C at {}",
                self.temperature_stats.max_temp, self.temperature_stats.max_temp_location
            )
        };

        let average = if self.temperature_stats.avg_temp.is_nan() {
            "No valid measurements".to_string()
        } else {
            format!("{:.1}°C", self.temperature_stats.avg_temp)
        };

        format!(
            "{}\n\n\
            Extreme Surface Temperatures (valid range only):\n\
            - Coolest: {}\n\
            - Hottest: {}\n\
            - Average: {}",
            self.summary(),
            coldest,
            hottest,
            average
        )
    }
}

impl Default for DatasetAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MergedRecord, SampleKey};

    fn labeled(day: u32, grid_id: u32, temp: f64, label: SeverityLabel) -> LabeledRecord {
        LabeledRecord {
            record: MergedRecord::from_features(
                SampleKey::new(NaiveDate::from_ymd_opt(2025, 3, day).unwrap(), grid_id),
                19.0 + grid_id as f64 * 0.05,
                72.8,
                [temp, 0.4, 29.0, 23.0, 70.0, 90.0, 3.0, 0.0, 40.0],
            ),
            cluster: 0,
            label,
        }
    }

    #[test]
    fn test_analyze_basic_statistics() {
        let records = vec![
            labeled(1, 0, 28.0, SeverityLabel::Low),
            labeled(1, 1, 36.0, SeverityLabel::High),
            labeled(2, 0, 29.0, SeverityLabel::Low),
        ];

        let stats = DatasetAnalyzer::new().analyze(&records).unwrap();

        assert_eq!(stats.total_records, 3);
        assert_eq!(stats.unique_cells, 2);
        assert_eq!(
            stats.date_range,
            (
                NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 3, 2).unwrap()
            )
        );
        assert_eq!(stats.temperature_stats.max_temp, 36.0);
        assert!(stats.temperature_stats.max_temp_location.contains("cell 1"));
    }

    #[test]
    fn test_sentinel_excluded_from_temperature_stats() {
        let records = vec![
            labeled(1, 0, 28.0, SeverityLabel::Low),
            labeled(1, 1, SENTINEL, SeverityLabel::Low),
        ];

        let stats = DatasetAnalyzer::new().analyze(&records).unwrap();

        assert_eq!(stats.temperature_stats.min_temp, 28.0);
        assert_eq!(stats.temperature_stats.avg_temp, 28.0);
    }

    #[test]
    fn test_label_distribution_in_vocabulary_order() {
        let records = vec![
            labeled(1, 0, 28.0, SeverityLabel::Low),
            labeled(1, 1, 36.0, SeverityLabel::High),
            labeled(1, 2, 37.0, SeverityLabel::High),
        ];

        let stats = DatasetAnalyzer::new().analyze(&records).unwrap();

        assert_eq!(stats.label_distribution[0], (SeverityLabel::High, 2));
        assert_eq!(stats.label_distribution[4], (SeverityLabel::Low, 1));
    }

    #[test]
    fn test_summary_renders() {
        let records = vec![labeled(1, 0, 28.0, SeverityLabel::Moderate)];
        let stats = DatasetAnalyzer::new().analyze(&records).unwrap();

        let summary = stats.detailed_summary();
        assert!(summary.contains("Records: 1 total"));
        assert!(summary.contains("Moderate UHI: 1"));
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(DatasetAnalyzer::new().analyze(&[]).is_err());
    }
}
