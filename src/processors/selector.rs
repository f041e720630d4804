use chrono::NaiveDate;
use tracing::warn;

use crate::error::{PipelineError, Result};
use crate::models::LabeledRecord;

/// The most-recent-date subset of the labeled dataset, one row per cell.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub date: NaiveDate,
    pub rows: Vec<LabeledRecord>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_for_cell(&self, grid_id: u32) -> Option<&LabeledRecord> {
        self.rows.iter().find(|row| row.record.grid_id == grid_id)
    }
}

/// Selects the latest complete day from the labeled dataset.
///
/// Rows outside the grid's expected id range are discarded; an incomplete
/// day is reported but still returned, since missing cells are a data
/// quality problem for upstream stages rather than a reason to fail here.
pub struct SnapshotSelector {
    expected_cells: u32,
}

impl SnapshotSelector {
    pub fn new(expected_cells: u32) -> Self {
        Self { expected_cells }
    }

    pub fn select(&self, records: &[LabeledRecord]) -> Result<Snapshot> {
        let date = records
            .iter()
            .map(|record| record.record.date)
            .max()
            .ok_or_else(|| PipelineError::MissingData("labeled dataset is empty".to_string()))?;

        let mut rows: Vec<LabeledRecord> = records
            .iter()
            .filter(|record| {
                record.record.date == date && record.record.grid_id < self.expected_cells
            })
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.record.grid_id);

        if rows.len() != self.expected_cells as usize {
            warn!(
                "Snapshot for {} covers {} of {} cells",
                date,
                rows.len(),
                self.expected_cells
            );
        }

        Ok(Snapshot { date, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MergedRecord, SampleKey, SeverityLabel};

    fn labeled(day: u32, grid_id: u32) -> LabeledRecord {
        let key = SampleKey::new(NaiveDate::from_ymd_opt(2025, 3, day).unwrap(), grid_id);
        LabeledRecord {
            record: MergedRecord::from_features(
                key,
                19.0,
                72.8,
                [30.0, 0.4, 29.0, 23.0, 70.0, 90.0, 3.0, 0.0, 40.0],
            ),
            cluster: 0,
            label: SeverityLabel::Moderate,
        }
    }

    #[test]
    fn test_selects_latest_date_only() {
        let records = vec![labeled(1, 0), labeled(1, 1), labeled(2, 1), labeled(2, 0)];
        let snapshot = SnapshotSelector::new(2).select(&records).unwrap();

        assert_eq!(snapshot.date, NaiveDate::from_ymd_opt(2025, 3, 2).unwrap());
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.rows.iter().all(|r| r.record.date == snapshot.date));
    }

    #[test]
    fn test_rows_sorted_by_cell() {
        let records = vec![labeled(2, 3), labeled(2, 0), labeled(2, 1), labeled(2, 2)];
        let snapshot = SnapshotSelector::new(4).select(&records).unwrap();

        let ids: Vec<u32> = snapshot.rows.iter().map(|r| r.record.grid_id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_out_of_range_cells_discarded() {
        let records = vec![labeled(2, 0), labeled(2, 1), labeled(2, 7)];
        let snapshot = SnapshotSelector::new(2).select(&records).unwrap();

        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.row_for_cell(7).is_none());
    }

    #[test]
    fn test_incomplete_day_still_returned() {
        let records = vec![labeled(2, 0)];
        let snapshot = SnapshotSelector::new(4).select(&records).unwrap();

        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_empty_dataset_rejected() {
        let result = SnapshotSelector::new(4).select(&[]);
        assert!(matches!(result, Err(PipelineError::MissingData(_))));
    }
}
