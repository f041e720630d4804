//! Keyed CSV artifact reading.
//!
//! Every pipeline artifact shares the same leading columns (`key`, `Date`,
//! `Lat`, `Lon`); the key column is authoritative and the `Date` column is
//! presentational only. Row handling is deliberately tolerant: a row with a
//! malformed key, coordinate or value is dropped with a warning, while an
//! empty value field is read as the missing-data sentinel.

use csv::StringRecord;
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

use crate::error::{PipelineError, Result};
use crate::models::{
    LabeledRecord, MergedRecord, ObservationRow, SampleKey, SeverityLabel, VariableKind,
    VariableTable, ARTIFACT_KEY_COLUMNS, FEATURE_COLUMNS, LABEL_COLUMNS,
};
use crate::utils::constants::{DEFAULT_BUFFER_SIZE, SENTINEL};

pub struct TableReader {
    use_mmap: bool,
}

impl TableReader {
    pub fn new() -> Self {
        Self { use_mmap: false }
    }

    pub fn with_mmap(use_mmap: bool) -> Self {
        Self { use_mmap }
    }

    /// Read one variable family's artifact.
    pub fn read_variable_table(&self, path: &Path, kind: VariableKind) -> Result<VariableTable> {
        if self.use_mmap {
            let file = File::open(path)?;
            let mmap = unsafe { Mmap::map(&file)? };
            let mut reader = csv_reader(&mmap[..]);
            self.parse_variable_table(&mut reader, kind)
        } else {
            let file = File::open(path)?;
            let mut reader = csv_reader(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file));
            self.parse_variable_table(&mut reader, kind)
        }
    }

    /// Read the merged dataset artifact.
    pub fn read_merged(&self, path: &Path) -> Result<Vec<MergedRecord>> {
        if self.use_mmap {
            let file = File::open(path)?;
            let mmap = unsafe { Mmap::map(&file)? };
            let mut reader = csv_reader(&mmap[..]);
            self.parse_merged(&mut reader)
        } else {
            let file = File::open(path)?;
            let mut reader = csv_reader(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file));
            self.parse_merged(&mut reader)
        }
    }

    /// Read the labeled dataset artifact.
    pub fn read_labeled(&self, path: &Path) -> Result<Vec<LabeledRecord>> {
        if self.use_mmap {
            let file = File::open(path)?;
            let mmap = unsafe { Mmap::map(&file)? };
            let mut reader = csv_reader(&mmap[..]);
            self.parse_labeled(&mut reader)
        } else {
            let file = File::open(path)?;
            let mut reader = csv_reader(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file));
            self.parse_labeled(&mut reader)
        }
    }

    fn parse_variable_table<R: Read>(
        &self,
        reader: &mut csv::Reader<R>,
        kind: VariableKind,
    ) -> Result<VariableTable> {
        let expected = expected_header(kind.columns(), false);
        check_header(reader, &expected)?;

        let mut table = VariableTable::new(kind);
        for result in reader.records() {
            let record = result?;
            if let Some((key, latitude, longitude, values)) =
                parse_keyed_row(&record, kind.columns().len())
            {
                table.push(ObservationRow {
                    key,
                    latitude,
                    longitude,
                    values,
                });
            }
        }

        table.sort();
        Ok(table)
    }

    fn parse_merged<R: Read>(&self, reader: &mut csv::Reader<R>) -> Result<Vec<MergedRecord>> {
        let expected = expected_header(&FEATURE_COLUMNS, false);
        check_header(reader, &expected)?;

        let mut records = Vec::new();
        for result in reader.records() {
            let record = result?;
            if let Some((key, latitude, longitude, values)) =
                parse_keyed_row(&record, FEATURE_COLUMNS.len())
            {
                let mut features = [0.0; 9];
                features.copy_from_slice(&values);
                records.push(MergedRecord::from_features(key, latitude, longitude, features));
            }
        }

        Ok(records)
    }

    fn parse_labeled<R: Read>(&self, reader: &mut csv::Reader<R>) -> Result<Vec<LabeledRecord>> {
        let expected = expected_header(&FEATURE_COLUMNS, true);
        check_header(reader, &expected)?;

        let mut records = Vec::new();
        for result in reader.records() {
            let record = result?;
            let Some((key, latitude, longitude, values)) =
                parse_keyed_row(&record, FEATURE_COLUMNS.len() + 1)
            else {
                continue;
            };

            let cluster = values[FEATURE_COLUMNS.len()];
            if cluster < 0.0 || cluster.fract() != 0.0 {
                warn_dropped(&record, "cluster index");
                continue;
            }

            let label_index = ARTIFACT_KEY_COLUMNS.len() + FEATURE_COLUMNS.len() + 1;
            if record.len() <= label_index {
                warn_dropped(&record, "column count");
                continue;
            }
            let label_field = &record[label_index];
            let label = match SeverityLabel::from_str(label_field) {
                Ok(label) => label,
                Err(_) => {
                    warn_dropped(&record, "severity label");
                    continue;
                }
            };

            let mut features = [0.0; 9];
            features.copy_from_slice(&values[..FEATURE_COLUMNS.len()]);
            records.push(LabeledRecord {
                record: MergedRecord::from_features(key, latitude, longitude, features),
                cluster: cluster as usize,
                label,
            });
        }

        Ok(records)
    }
}

impl Default for TableReader {
    fn default() -> Self {
        Self::new()
    }
}

fn csv_reader<R: Read>(inner: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(inner)
}

fn expected_header(value_columns: &[&str], labeled: bool) -> Vec<String> {
    let mut header: Vec<String> = ARTIFACT_KEY_COLUMNS
        .iter()
        .map(|column| column.to_string())
        .collect();
    header.extend(value_columns.iter().map(|column| column.to_string()));
    if labeled {
        header.extend(LABEL_COLUMNS.iter().map(|column| column.to_string()));
    }
    header
}

fn check_header<R: Read>(reader: &mut csv::Reader<R>, expected: &[String]) -> Result<()> {
    let headers = reader.headers()?;
    if headers.len() != expected.len() || headers.iter().zip(expected).any(|(a, b)| a != b) {
        return Err(PipelineError::InvalidFormat(format!(
            "unexpected columns: got [{}], expected [{}]",
            headers.iter().collect::<Vec<_>>().join(", "),
            expected.join(", ")
        )));
    }
    Ok(())
}

/// Parses the shared row layout: key, Date, Lat, Lon, then `value_count`
/// numeric columns (the labeled layout appends one non-numeric column which
/// callers read separately). Returns `None` for rows to drop.
fn parse_keyed_row(
    record: &StringRecord,
    value_count: usize,
) -> Option<(SampleKey, f64, f64, Vec<f64>)> {
    let numeric_end = ARTIFACT_KEY_COLUMNS.len() + value_count;
    if record.len() < numeric_end {
        warn_dropped(record, "column count");
        return None;
    }

    let key = match SampleKey::parse(&record[0]) {
        Ok(key) => key,
        Err(_) => {
            warn_dropped(record, "key");
            return None;
        }
    };

    let latitude = match record[2].parse::<f64>() {
        Ok(value) => value,
        Err(_) => {
            warn_dropped(record, "latitude");
            return None;
        }
    };
    let longitude = match record[3].parse::<f64>() {
        Ok(value) => value,
        Err(_) => {
            warn_dropped(record, "longitude");
            return None;
        }
    };

    let mut values = Vec::with_capacity(value_count);
    for index in ARTIFACT_KEY_COLUMNS.len()..numeric_end {
        let field = &record[index];
        if field.is_empty() {
            values.push(SENTINEL);
            continue;
        }
        match field.parse::<f64>() {
            Ok(value) => values.push(value),
            Err(_) => {
                warn_dropped(record, "value");
                return None;
            }
        }
    }

    Some((key, latitude, longitude, values))
}

fn warn_dropped(record: &StringRecord, what: &str) {
    let line = record
        .position()
        .map(|position| position.line().to_string())
        .unwrap_or_else(|| "?".to_string());
    warn!("Dropping row at line {} with malformed {}", line, what);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_lst_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "key,Date,Lat,Lon,LST_Celsius").unwrap();
        writeln!(file, "20250301_1,2025-03-01,19.02,72.81,31.5").unwrap();
        writeln!(file, "20250301_0,2025-03-01,19.02,72.77,30.2").unwrap();
        writeln!(file, "garbage,2025-03-01,19.02,72.77,30.2").unwrap();
        writeln!(file, "20250302_0,2025-03-02,19.02,72.77,").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_read_variable_table_drops_malformed_and_sorts() {
        let file = write_lst_file();
        let reader = TableReader::new();

        let table = reader
            .read_variable_table(file.path(), VariableKind::SurfaceTemperature)
            .unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.rows[0].key.encode(), "20250301_0");
        assert_eq!(table.rows[1].key.encode(), "20250301_1");
        // Empty value field reads as the sentinel
        assert_eq!(table.rows[2].values[0], SENTINEL);
    }

    #[test]
    fn test_mmap_path_matches_buffered() {
        let file = write_lst_file();

        let buffered = TableReader::new()
            .read_variable_table(file.path(), VariableKind::SurfaceTemperature)
            .unwrap();
        let mapped = TableReader::with_mmap(true)
            .read_variable_table(file.path(), VariableKind::SurfaceTemperature)
            .unwrap();

        assert_eq!(buffered, mapped);
    }

    #[test]
    fn test_header_mismatch_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "key,Date,Lat,Lon,NDVI").unwrap();
        writeln!(file, "20250301_0,2025-03-01,19.02,72.77,0.4").unwrap();
        file.flush().unwrap();

        let result =
            TableReader::new().read_variable_table(file.path(), VariableKind::SurfaceTemperature);
        assert!(matches!(result, Err(PipelineError::InvalidFormat(_))));
    }

    #[test]
    fn test_read_merged() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "key,Date,Lat,Lon,LST_Celsius,NDVI,Air_Temperature_C,Dew_Point_Temperature_C,\
             Relative_Humidity_%,WindDirection,WindSpeed,Rainfall_mm,impervious_percentage"
        )
        .unwrap();
        writeln!(
            file,
            "20250301_5,2025-03-01,19.07,72.79,33.1,0.38,30.5,24.0,68.2,142.0,3.4,0.0,61.5"
        )
        .unwrap();
        file.flush().unwrap();

        let records = TableReader::new().read_merged(file.path()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].grid_id, 5);
        assert_eq!(records[0].surface_temp_c, 33.1);
        assert_eq!(records[0].impervious_pct, 61.5);
    }

    #[test]
    fn test_read_labeled() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "key,Date,Lat,Lon,LST_Celsius,NDVI,Air_Temperature_C,Dew_Point_Temperature_C,\
             Relative_Humidity_%,WindDirection,WindSpeed,Rainfall_mm,impervious_percentage,\
             Cluster,UHI_Label"
        )
        .unwrap();
        writeln!(
            file,
            "20250301_5,2025-03-01,19.07,72.79,33.1,0.38,30.5,24.0,68.2,142.0,3.4,0.0,61.5,\
             2,High UHI"
        )
        .unwrap();
        writeln!(
            file,
            "20250301_6,2025-03-01,19.07,72.84,28.0,0.61,27.5,22.0,71.0,130.0,4.1,0.2,22.0,\
             0,not a label"
        )
        .unwrap();
        file.flush().unwrap();

        let records = TableReader::new().read_labeled(file.path()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].cluster, 2);
        assert_eq!(records[0].label, SeverityLabel::High);
    }
}
