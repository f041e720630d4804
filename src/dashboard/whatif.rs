//! Single-cell what-if exploration.
//!
//! An override session works on an in-memory copy of the latest snapshot.
//! The user picks one grid cell and repositions six bounded sliders; applying
//! the adjustment rewrites that row's variables and relabels it with a quick
//! temperature-threshold rule. Every other row keeps its batch label, and
//! nothing is ever written back to the persisted artifacts.

use chrono::NaiveDate;
use tracing::debug;
use validator::Validate;

use crate::error::{PipelineError, Result};
use crate::models::{LabeledRecord, MergedRecord, SeverityLabel};
use crate::processors::Snapshot;
use crate::utils::constants::{
    MAX_VALID_RAINFALL_MM, MAX_VALID_TEMP_C, MAX_VALID_WIND_MS, MIN_VALID_TEMP_C,
    QUICK_LABEL_LOW_MAX_C, QUICK_LABEL_MODERATE_MAX_C,
};

/// Severity for an adjusted row, from surface temperature alone. Coarser
/// than the batch clusterer on purpose: a slider drag relabels one row
/// without refitting anything.
pub fn severity_for_temperature(temp_c: f64) -> SeverityLabel {
    if temp_c <= QUICK_LABEL_LOW_MAX_C {
        SeverityLabel::Low
    } else if temp_c <= QUICK_LABEL_MODERATE_MAX_C {
        SeverityLabel::Moderate
    } else {
        SeverityLabel::High
    }
}

/// One slider configuration: the six adjustable variables for one cell.
/// Ranges match the slider travel; the impervious slider works in
/// fractions of cell area.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct Adjustment {
    pub grid_id: u32,

    #[validate(range(min = -10.0, max = 50.0))]
    pub surface_temp_c: f64,

    #[validate(range(min = 0.0, max = 1.0))]
    pub vegetation_index: f64,

    #[validate(range(min = 0.0, max = 2000.0))]
    pub rainfall_mm: f64,

    #[validate(range(min = 0.0, max = 100.0))]
    pub relative_humidity: f64,

    #[validate(range(min = 0.0, max = 15.0))]
    pub wind_speed_ms: f64,

    #[validate(range(min = 0.0, max = 1.0))]
    pub impervious_fraction: f64,
}

impl Adjustment {
    /// Initial slider positions for a row: its current values, clamped into
    /// the slider travel so a sentinel never pins a slider off-scale.
    pub fn from_record(record: &MergedRecord) -> Self {
        Self {
            grid_id: record.grid_id,
            surface_temp_c: record
                .surface_temp_c
                .clamp(MIN_VALID_TEMP_C, MAX_VALID_TEMP_C),
            vegetation_index: record.vegetation_index.clamp(0.0, 1.0),
            rainfall_mm: record.rainfall_mm.clamp(0.0, MAX_VALID_RAINFALL_MM),
            relative_humidity: record.relative_humidity.clamp(0.0, 100.0),
            wind_speed_ms: record.wind_speed_ms.clamp(0.0, MAX_VALID_WIND_MS),
            impervious_fraction: (record.impervious_pct / 100.0).clamp(0.0, 1.0),
        }
    }
}

/// In-memory working copy of a snapshot for what-if adjustments.
#[derive(Debug, Clone)]
pub struct OverrideSession {
    date: NaiveDate,
    rows: Vec<LabeledRecord>,
}

impl OverrideSession {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            date: snapshot.date,
            rows: snapshot.rows.clone(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn rows(&self) -> &[LabeledRecord] {
        &self.rows
    }

    pub fn row(&self, grid_id: u32) -> Option<&LabeledRecord> {
        self.rows.iter().find(|row| row.record.grid_id == grid_id)
    }

    /// Apply one adjustment: rewrite the targeted row's six variables and
    /// relabel it from its new surface temperature. The cluster index and
    /// every other row stay exactly as the batch run left them.
    pub fn apply(&mut self, adjustment: &Adjustment) -> Result<&LabeledRecord> {
        adjustment.validate()?;

        let row = self
            .rows
            .iter_mut()
            .find(|row| row.record.grid_id == adjustment.grid_id)
            .ok_or(PipelineError::UnknownCell(adjustment.grid_id))?;

        row.record.surface_temp_c = adjustment.surface_temp_c;
        row.record.vegetation_index = adjustment.vegetation_index;
        row.record.rainfall_mm = adjustment.rainfall_mm;
        row.record.relative_humidity = adjustment.relative_humidity;
        row.record.wind_speed_ms = adjustment.wind_speed_ms;
        row.record.impervious_pct = adjustment.impervious_fraction * 100.0;
        row.label = severity_for_temperature(adjustment.surface_temp_c);

        debug!(
            "Cell {} adjusted to {:.1} C, relabeled {}",
            adjustment.grid_id, adjustment.surface_temp_c, row.label
        );
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::models::{MergedRecordBuilder, SampleKey};
    use crate::utils::constants::SENTINEL;

    fn labeled(grid_id: u32, temp: f64, label: SeverityLabel) -> LabeledRecord {
        let record = MergedRecordBuilder::new()
            .key(SampleKey::new(
                NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
                grid_id,
            ))
            .coordinates(19.1, 72.9)
            .surface_temp(temp)
            .vegetation(0.4)
            .humidity(29.0, 22.0, 61.0)
            .wind(130.0, 4.0)
            .rainfall(0.5)
            .impervious(40.0)
            .build()
            .unwrap();
        LabeledRecord {
            record,
            cluster: 2,
            label,
        }
    }

    fn session() -> OverrideSession {
        let snapshot = Snapshot {
            date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            rows: vec![
                labeled(0, 27.0, SeverityLabel::Low),
                labeled(1, 33.0, SeverityLabel::Moderate),
                labeled(2, 41.0, SeverityLabel::High),
            ],
        };
        OverrideSession::from_snapshot(&snapshot)
    }

    #[test]
    fn test_quick_rule_thresholds() {
        assert_eq!(severity_for_temperature(25.0), SeverityLabel::Low);
        assert_eq!(severity_for_temperature(30.0), SeverityLabel::Low);
        assert_eq!(severity_for_temperature(30.1), SeverityLabel::Moderate);
        assert_eq!(severity_for_temperature(35.0), SeverityLabel::Moderate);
        assert_eq!(severity_for_temperature(35.1), SeverityLabel::High);
    }

    #[test]
    fn test_apply_changes_only_the_target_row() {
        let mut session = session();
        let untouched_first = session.row(0).cloned().unwrap();
        let untouched_last = session.row(2).cloned().unwrap();

        let mut adjustment = Adjustment::from_record(&session.row(1).unwrap().record);
        adjustment.surface_temp_c = 43.0;
        session.apply(&adjustment).unwrap();

        assert_eq!(session.row(1).unwrap().label, SeverityLabel::High);
        assert_eq!(session.row(1).unwrap().record.surface_temp_c, 43.0);
        assert_eq!(session.row(0), Some(&untouched_first));
        assert_eq!(session.row(2), Some(&untouched_last));
    }

    #[test]
    fn test_apply_preserves_cluster_index() {
        let mut session = session();
        let mut adjustment = Adjustment::from_record(&session.row(2).unwrap().record);
        adjustment.surface_temp_c = 20.0;

        let row = session.apply(&adjustment).unwrap();
        assert_eq!(row.cluster, 2);
        assert_eq!(row.label, SeverityLabel::Low);
    }

    #[test]
    fn test_impervious_slider_converts_back_to_percentage() {
        let mut session = session();
        let mut adjustment = Adjustment::from_record(&session.row(0).unwrap().record);
        assert_eq!(adjustment.impervious_fraction, 0.4);

        adjustment.impervious_fraction = 0.85;
        let row = session.apply(&adjustment).unwrap();
        assert_eq!(row.record.impervious_pct, 85.0);
    }

    #[test]
    fn test_out_of_travel_adjustment_rejected() {
        let mut session = session();
        let mut adjustment = Adjustment::from_record(&session.row(0).unwrap().record);
        adjustment.surface_temp_c = 60.0;

        assert!(matches!(
            session.apply(&adjustment),
            Err(PipelineError::Validation(_))
        ));
    }

    #[test]
    fn test_unknown_cell_rejected() {
        let mut session = session();
        let mut adjustment = Adjustment::from_record(&session.row(0).unwrap().record);
        adjustment.grid_id = 99;

        assert!(matches!(
            session.apply(&adjustment),
            Err(PipelineError::UnknownCell(99))
        ));
    }

    #[test]
    fn test_sentinel_never_pins_a_slider_off_scale() {
        let mut row = labeled(0, 31.0, SeverityLabel::Moderate);
        row.record.rainfall_mm = SENTINEL;

        let adjustment = Adjustment::from_record(&row.record);
        assert_eq!(adjustment.rainfall_mm, 0.0);
        assert!(adjustment.validate().is_ok());
    }
}
