use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use uhi_pipeline::analyzers::Clusterer;
use uhi_pipeline::config::{ClusterConfig, StudyAreaConfig};
use uhi_pipeline::models::{
    Grid, ObservationRow, SampleKey, VariableKind, VariableTable,
};
use uhi_pipeline::processors::{SnapshotSelector, TableMerger};

// Synthetic variable tables over the default study grid
fn build_tables(grid: &Grid, days: usize) -> Vec<VariableTable> {
    let start = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();

    VariableKind::ALL
        .iter()
        .map(|&kind| {
            let mut table = VariableTable::new(kind);
            for day in 0..days {
                let date = start + chrono::Duration::days(day as i64);
                for cell in grid.cells() {
                    let id = cell.id;
                    let values = match kind {
                        VariableKind::SurfaceTemperature => {
                            vec![28.0 + (id % 7) as f64 + day as f64 * 0.1]
                        }
                        VariableKind::Vegetation => vec![0.2 + (id % 5) as f64 * 0.1],
                        VariableKind::Rainfall => vec![(day % 3) as f64 * 1.5],
                        VariableKind::Wind => vec![90.0, 2.0 + (id % 4) as f64],
                        VariableKind::Humidity => {
                            vec![29.0 + (id % 7) as f64, 23.0, 55.0 + (id % 9) as f64]
                        }
                        VariableKind::Impervious => vec![(id % 10) as f64 * 10.0],
                    };
                    table.push(ObservationRow {
                        key: SampleKey::new(date, id),
                        latitude: cell.lat_center,
                        longitude: cell.lon_center,
                        values,
                    });
                }
            }
            table.sort();
            table
        })
        .collect()
}

fn cluster_config() -> ClusterConfig {
    ClusterConfig {
        count: 5,
        seed: 42,
        max_iterations: 300,
        tolerance: 1e-4,
    }
}

fn benchmark_table_merger(c: &mut Criterion) {
    let grid = Grid::from_study_area(&StudyAreaConfig::default());
    let tables = build_tables(&grid, 30);

    c.bench_function("table_merger", |b| {
        b.iter(|| {
            let merger = TableMerger::new();
            let records = merger.merge(black_box(&tables)).unwrap();
            black_box(records.len())
        })
    });
}

fn benchmark_clusterer(c: &mut Criterion) {
    let grid = Grid::from_study_area(&StudyAreaConfig::default());
    let tables = build_tables(&grid, 5);
    let records = TableMerger::new().merge(&tables).unwrap();

    c.bench_function("clusterer", |b| {
        b.iter(|| {
            let clusterer = Clusterer::new(cluster_config());
            let outcome = clusterer.label(black_box(&records)).unwrap();
            black_box(outcome.records.len())
        })
    });
}

fn benchmark_snapshot_selection(c: &mut Criterion) {
    let grid = Grid::from_study_area(&StudyAreaConfig::default());
    let tables = build_tables(&grid, 30);
    let records = TableMerger::new().merge(&tables).unwrap();
    let labeled = Clusterer::new(cluster_config()).label(&records).unwrap();

    c.bench_function("snapshot_selection", |b| {
        b.iter(|| {
            let selector = SnapshotSelector::new(grid.len() as u32);
            let snapshot = selector.select(black_box(&labeled.records)).unwrap();
            black_box(snapshot.len())
        })
    });
}

fn benchmark_merge_by_window_length(c: &mut Criterion) {
    let grid = Grid::from_study_area(&StudyAreaConfig::default());
    let mut group = c.benchmark_group("merge_by_window_length");

    for &days in &[5, 15, 30] {
        group.bench_with_input(BenchmarkId::new("days", days), &days, |b, &days| {
            let tables = build_tables(&grid, days);
            b.iter(|| {
                let records = TableMerger::new().merge(&tables).unwrap();
                black_box(records.len())
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_table_merger,
    benchmark_clusterer,
    benchmark_snapshot_selection,
    benchmark_merge_by_window_length
);
criterion_main!(benches);
