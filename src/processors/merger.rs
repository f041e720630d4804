use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::models::{
    MergedRecord, MergedRecordBuilder, ObservationRow, VariableKind, VariableTable,
};
use crate::utils::constants::SENTINEL;

/// Joins the per-variable tables into one record per (date, cell).
///
/// The surface-temperature table is the spine: every one of its rows yields
/// exactly one merged record, with identity and coordinates taken from it.
/// Each family's value is then resolved per cell with a cadence-tolerant
/// lookup: the exact date if sampled there, else the most recent prior
/// sample, else the earliest available one. Sentinel-valued samples count
/// as missing during resolution, so a column only stays at the sentinel
/// when a cell has no usable sample at all.
pub struct TableMerger {
    sentinel: f64,
}

impl TableMerger {
    pub fn new() -> Self {
        Self { sentinel: SENTINEL }
    }

    pub fn with_sentinel(sentinel: f64) -> Self {
        Self { sentinel }
    }

    /// Merge all six family tables. The slice must contain each family
    /// exactly once, in any order.
    pub fn merge(&self, tables: &[VariableTable]) -> Result<Vec<MergedRecord>> {
        let by_kind = self.index_families(tables)?;
        let spine = by_kind[&VariableKind::SurfaceTemperature];

        let mut lookups: HashMap<VariableKind, FamilyLookup> = HashMap::new();
        for kind in VariableKind::ALL {
            lookups.insert(kind, FamilyLookup::build(by_kind[&kind], self.sentinel));
        }

        let mut records = Vec::with_capacity(spine.len());
        for row in &spine.rows {
            let mut builder = MergedRecordBuilder::new()
                .key(row.key)
                .coordinates(row.latitude, row.longitude);

            for kind in VariableKind::ALL {
                let values = match lookups[&kind].resolve(row.key.grid_id, row.key.date) {
                    Some(values) => values.to_vec(),
                    None => {
                        debug!(
                            "No usable {} sample for cell {}, keeping sentinel",
                            kind, row.key.grid_id
                        );
                        vec![self.sentinel; kind.columns().len()]
                    }
                };
                builder = apply_family(builder, kind, &values);
            }

            records.push(builder.build()?);
        }

        records.sort_by_key(|record| record.key());
        Ok(records)
    }

    fn index_families<'a>(
        &self,
        tables: &'a [VariableTable],
    ) -> Result<HashMap<VariableKind, &'a VariableTable>> {
        let mut by_kind = HashMap::new();
        for table in tables {
            if by_kind.insert(table.kind, table).is_some() {
                return Err(PipelineError::DataMerge(format!(
                    "duplicate {} table",
                    table.kind
                )));
            }
        }

        for kind in VariableKind::ALL {
            if !by_kind.contains_key(&kind) {
                return Err(PipelineError::DataMerge(format!("missing {} table", kind)));
            }
        }

        Ok(by_kind)
    }
}

impl Default for TableMerger {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_family(
    builder: MergedRecordBuilder,
    kind: VariableKind,
    values: &[f64],
) -> MergedRecordBuilder {
    match kind {
        VariableKind::SurfaceTemperature => builder.surface_temp(values[0]),
        VariableKind::Vegetation => builder.vegetation(values[0]),
        VariableKind::Rainfall => builder.rainfall(values[0]),
        VariableKind::Wind => builder.wind(values[0], values[1]),
        VariableKind::Humidity => builder.humidity(values[0], values[1], values[2]),
        VariableKind::Impervious => builder.impervious(values[0]),
    }
}

/// Per-cell, date-sorted samples of one family with sentinels filtered out.
struct FamilyLookup<'a> {
    per_cell: HashMap<u32, Vec<&'a ObservationRow>>,
}

impl<'a> FamilyLookup<'a> {
    fn build(table: &'a VariableTable, sentinel: f64) -> Self {
        let mut per_cell: HashMap<u32, Vec<&ObservationRow>> = HashMap::new();
        for row in &table.rows {
            if row.values.iter().any(|value| *value == sentinel) {
                continue;
            }
            per_cell.entry(row.key.grid_id).or_default().push(row);
        }

        for rows in per_cell.values_mut() {
            rows.sort_by_key(|row| row.key.date);
        }

        Self { per_cell }
    }

    /// Exact date, else most recent prior sample, else earliest available.
    fn resolve(&self, grid_id: u32, date: NaiveDate) -> Option<&[f64]> {
        let rows = self.per_cell.get(&grid_id)?;
        if rows.is_empty() {
            return None;
        }

        let insertion = rows.partition_point(|row| row.key.date < date);
        if let Some(row) = rows.get(insertion) {
            if row.key.date == date {
                return Some(&row.values);
            }
        }
        if insertion > 0 {
            return Some(&rows[insertion - 1].values);
        }
        Some(&rows[0].values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SampleKey;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    fn table(kind: VariableKind, rows: Vec<(u32, u32, Vec<f64>)>) -> VariableTable {
        let mut table = VariableTable::new(kind);
        for (day, grid_id, values) in rows {
            table.push(ObservationRow {
                key: SampleKey::new(date(day), grid_id),
                latitude: 19.0,
                longitude: 72.8,
                values,
            });
        }
        table.sort();
        table
    }

    fn full_set(ndvi_rows: Vec<(u32, u32, Vec<f64>)>) -> Vec<VariableTable> {
        vec![
            table(
                VariableKind::SurfaceTemperature,
                vec![(1, 0, vec![30.0]), (2, 0, vec![31.0]), (3, 0, vec![32.0])],
            ),
            table(VariableKind::Vegetation, ndvi_rows),
            table(
                VariableKind::Rainfall,
                vec![(1, 0, vec![0.0]), (2, 0, vec![1.5]), (3, 0, vec![0.2])],
            ),
            table(
                VariableKind::Wind,
                vec![
                    (1, 0, vec![90.0, 3.0]),
                    (2, 0, vec![92.0, 3.5]),
                    (3, 0, vec![95.0, 4.0]),
                ],
            ),
            table(
                VariableKind::Humidity,
                vec![
                    (1, 0, vec![29.0, 23.0, 70.0]),
                    (2, 0, vec![29.5, 23.5, 71.0]),
                    (3, 0, vec![30.0, 24.0, 72.0]),
                ],
            ),
            table(
                VariableKind::Impervious,
                vec![(1, 0, vec![40.0]), (2, 0, vec![40.0]), (3, 0, vec![40.0])],
            ),
        ]
    }

    #[test]
    fn test_exact_match_wins() {
        let tables = full_set(vec![(1, 0, vec![0.30]), (2, 0, vec![0.50]), (3, 0, vec![0.70])]);
        let records = TableMerger::new().merge(&tables).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[1].vegetation_index, 0.50);
    }

    #[test]
    fn test_prior_sample_fills_gap() {
        // Vegetation sampled on day 1 only; later days reuse it
        let tables = full_set(vec![(1, 0, vec![0.30])]);
        let records = TableMerger::new().merge(&tables).unwrap();

        assert_eq!(records[1].vegetation_index, 0.30);
        assert_eq!(records[2].vegetation_index, 0.30);
    }

    #[test]
    fn test_earliest_sample_backfills_leading_gap() {
        // Vegetation first sampled on day 3; earlier days borrow it
        let tables = full_set(vec![(3, 0, vec![0.70])]);
        let records = TableMerger::new().merge(&tables).unwrap();

        assert_eq!(records[0].vegetation_index, 0.70);
        assert_eq!(records[1].vegetation_index, 0.70);
    }

    #[test]
    fn test_sentinel_sample_skipped_in_resolution() {
        // Exact-date sample on day 2 is a sentinel; the day 1 sample wins
        let tables = full_set(vec![(1, 0, vec![0.30]), (2, 0, vec![SENTINEL])]);
        let records = TableMerger::new().merge(&tables).unwrap();

        assert_eq!(records[1].vegetation_index, 0.30);
        assert!(!records[1].has_sentinel(SENTINEL));
    }

    #[test]
    fn test_cell_without_any_sample_keeps_sentinel() {
        let tables = full_set(vec![]);
        let records = TableMerger::new().merge(&tables).unwrap();

        assert!(records.iter().all(|r| r.vegetation_index == SENTINEL));
    }

    #[test]
    fn test_missing_family_rejected() {
        let mut tables = full_set(vec![(1, 0, vec![0.30])]);
        tables.retain(|t| t.kind != VariableKind::Rainfall);

        let result = TableMerger::new().merge(&tables);
        assert!(matches!(result, Err(PipelineError::DataMerge(_))));
    }

    #[test]
    fn test_output_sorted_by_key() {
        let tables = full_set(vec![(1, 0, vec![0.30])]);
        let records = TableMerger::new().merge(&tables).unwrap();

        let keys: Vec<String> = records.iter().map(|r| r.key().encode()).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }
}
