//! CSV artifact writing.
//!
//! Every keyed artifact is written with the same leading columns the reader
//! expects (`key`, `Date`, `Lat`, `Lon`), so a written file always reads
//! back through [`TableReader`](crate::readers::TableReader) unchanged.

use std::path::Path;

use chrono::NaiveDate;
use tracing::info;

use crate::analyzers::ClusterSummaryRow;
use crate::error::Result;
use crate::models::{
    LabeledRecord, MergedRecord, SampleKey, VariableTable, ARTIFACT_KEY_COLUMNS,
    FEATURE_COLUMNS, LABEL_COLUMNS,
};
use crate::processors::Snapshot;

pub struct CsvWriter;

impl CsvWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write one variable family's artifact.
    pub fn write_variable_table(&self, table: &VariableTable, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;

        let columns: Vec<&str> = table.columns.iter().map(|c| c.as_str()).collect();
        writer.write_record(header(&columns, false))?;

        for row in &table.rows {
            let mut record = key_fields(row.key.date, row.key.grid_id, row.latitude, row.longitude);
            record.extend(row.values.iter().map(|v| v.to_string()));
            writer.write_record(&record)?;
        }

        writer.flush()?;
        info!(
            "Wrote {} {} rows to {}",
            table.len(),
            table.kind,
            path.display()
        );
        Ok(())
    }

    /// Write the merged dataset artifact.
    pub fn write_merged(&self, records: &[MergedRecord], path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(header(&FEATURE_COLUMNS, false))?;

        for record in records {
            let mut fields =
                key_fields(record.date, record.grid_id, record.latitude, record.longitude);
            fields.extend(record.feature_values().iter().map(|v| v.to_string()));
            writer.write_record(&fields)?;
        }

        writer.flush()?;
        info!("Wrote {} merged rows to {}", records.len(), path.display());
        Ok(())
    }

    /// Write the labeled dataset artifact: merged columns plus the cluster
    /// index and severity label.
    pub fn write_labeled(&self, records: &[LabeledRecord], path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(header(&FEATURE_COLUMNS, true))?;

        for labeled in records {
            let record = &labeled.record;
            let mut fields =
                key_fields(record.date, record.grid_id, record.latitude, record.longitude);
            fields.extend(record.feature_values().iter().map(|v| v.to_string()));
            fields.push(labeled.cluster.to_string());
            fields.push(labeled.label.as_str().to_string());
            writer.write_record(&fields)?;
        }

        writer.flush()?;
        info!("Wrote {} labeled rows to {}", records.len(), path.display());
        Ok(())
    }

    /// Write the latest-date snapshot; same layout as the labeled artifact.
    pub fn write_snapshot(&self, snapshot: &Snapshot, path: &Path) -> Result<()> {
        self.write_labeled(&snapshot.rows, path)
    }

    /// Write the per-cluster summary table.
    pub fn write_cluster_summary(&self, summary: &[ClusterSummaryRow], path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["Cluster", "UHI_Label", "Count", "Mean_LST_Celsius"])?;

        for row in summary {
            writer.write_record([
                row.cluster.to_string(),
                row.label.as_str().to_string(),
                row.count.to_string(),
                row.mean_surface_temp.to_string(),
            ])?;
        }

        writer.flush()?;
        info!(
            "Wrote {} cluster summary rows to {}",
            summary.len(),
            path.display()
        );
        Ok(())
    }
}

impl Default for CsvWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn header(value_columns: &[&str], labeled: bool) -> Vec<String> {
    let mut columns: Vec<String> = ARTIFACT_KEY_COLUMNS
        .iter()
        .map(|column| column.to_string())
        .collect();
    columns.extend(value_columns.iter().map(|column| column.to_string()));
    if labeled {
        columns.extend(LABEL_COLUMNS.iter().map(|column| column.to_string()));
    }
    columns
}

fn key_fields(date: NaiveDate, grid_id: u32, latitude: f64, longitude: f64) -> Vec<String> {
    vec![
        SampleKey::new(date, grid_id).encode(),
        date.format("%Y-%m-%d").to_string(),
        latitude.to_string(),
        longitude.to_string(),
    ]
}
