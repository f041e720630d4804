use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::Level;

use crate::analyzers::{Clusterer, DatasetAnalyzer};
use crate::cli::args::{Cli, Commands};
use crate::config::PipelineConfig;
use crate::dashboard::{Adjustment, LayerKind, OverrideSession};
use crate::error::{PipelineError, Result};
use crate::extract::extractor_for;
use crate::models::{Grid, MergedRecord, VariableKind};
use crate::processors::{IntegrityChecker, SnapshotSelector, TableMerger};
use crate::readers::TableReader;
use crate::remote::{FileStore, HttpEoService, HttpStore, LocalDirStore};
use crate::utils::{
    generate_default_export_dir, generate_default_report_filename, ProgressReporter,
};
use crate::writers::{CsvWriter, GeoJsonWriter};

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    let config = PipelineConfig::load(cli.config.as_deref())?;
    let quiet = cli.quiet;

    match cli.command {
        Commands::Run { skip_extract } => {
            if skip_extract {
                println!("Reusing stored variable artifacts");
            } else {
                extract_families(&config, &VariableKind::ALL, quiet).await?;
            }
            merge_tables(&config, quiet).await?;
            cluster_dataset(&config, quiet).await?;
            select_snapshot(&config, quiet).await?;
            println!("Pipeline complete!");
        }

        Commands::Extract { family } => {
            let families = match family {
                Some(name) => vec![name.parse()?],
                None => VariableKind::ALL.to_vec(),
            };
            extract_families(&config, &families, quiet).await?;
        }

        Commands::Merge => merge_tables(&config, quiet).await?,

        Commands::Cluster => cluster_dataset(&config, quiet).await?,

        Commands::Snapshot => select_snapshot(&config, quiet).await?,

        Commands::Layers { output, layer } => {
            let layers = match layer {
                Some(name) => vec![name.parse()?],
                None => LayerKind::ALL.to_vec(),
            };

            let store = build_store(&config)?;
            let reader = TableReader::new();

            let path = store.fetch(&config.artifacts.snapshot).await?;
            let rows = reader.read_labeled(&path)?;

            let grid = Grid::from_study_area(&config.study_area);
            let snapshot = SnapshotSelector::new(grid.len() as u32).select(&rows)?;

            let out_dir = output.unwrap_or_else(generate_default_export_dir);
            fs::create_dir_all(&out_dir)?;
            println!(
                "Exporting overlays for {} to {}",
                snapshot.date,
                out_dir.display()
            );

            let writer = GeoJsonWriter::with_sentinel(config.sentinel);
            writer.write_grid_outline(&grid, &out_dir.join("grid.geojson"))?;

            let progress = ProgressReporter::new(layers.len() as u64, "Exporting layers", quiet);
            for kind in &layers {
                let file = out_dir.join(format!("{}.geojson", kind.slug()));
                writer.write_layer(*kind, &snapshot, &grid, &file)?;
                progress.increment(1);
            }
            progress.finish_with_message(&format!(
                "Exported {} layers plus the grid outline",
                layers.len()
            ));
        }

        Commands::WhatIf {
            cell,
            lst,
            ndvi,
            rainfall,
            humidity,
            wind,
            isa,
        } => {
            let store = build_store(&config)?;
            let reader = TableReader::new();

            let path = store.fetch(&config.artifacts.snapshot).await?;
            let rows = reader.read_labeled(&path)?;

            let grid = Grid::from_study_area(&config.study_area);
            let snapshot = SnapshotSelector::new(grid.len() as u32).select(&rows)?;

            let mut session = OverrideSession::from_snapshot(&snapshot);
            let current = session.row(cell).ok_or(PipelineError::UnknownCell(cell))?;
            let before_label = current.label;
            let before_temp = current.record.surface_temp_c;

            let mut adjustment = Adjustment::from_record(&current.record);
            if let Some(value) = lst {
                adjustment.surface_temp_c = value;
            }
            if let Some(value) = ndvi {
                adjustment.vegetation_index = value;
            }
            if let Some(value) = rainfall {
                adjustment.rainfall_mm = value;
            }
            if let Some(value) = humidity {
                adjustment.relative_humidity = value;
            }
            if let Some(value) = wind {
                adjustment.wind_speed_ms = value;
            }
            if let Some(value) = isa {
                adjustment.impervious_fraction = value;
            }

            let date = session.date();
            let row = session.apply(&adjustment)?;

            println!("Cell {} on {}:", cell, date);
            println!("  Before: {} at {:.1}°C", before_label, before_temp);
            println!(
                "  After:  {} at {:.1}°C",
                row.label, row.record.surface_temp_c
            );
        }

        Commands::Info {
            sample,
            save_report,
        } => {
            println!("Analyzing labeled dataset...");

            let store = build_store(&config)?;
            let reader = TableReader::new();

            let path = store.fetch(&config.artifacts.labeled).await?;
            let labeled = reader.read_labeled(&path)?;

            let analyzer = DatasetAnalyzer::new();
            let stats = analyzer.analyze(&labeled)?;
            println!("\n{}", stats.detailed_summary());

            let merged: Vec<MergedRecord> =
                labeled.iter().map(|row| row.record.clone()).collect();
            let checker = IntegrityChecker::with_sentinel(config.sentinel);
            let report = checker.check(&merged)?;
            println!("{}", checker.generate_summary(&report));

            if report.violations.is_empty() {
                println!("✅ All records passed range checks");
            } else {
                println!("⚠️  Found {} range violations", report.violations.len());
            }

            if sample > 0 {
                let grid = Grid::from_study_area(&config.study_area);
                match SnapshotSelector::new(grid.len() as u32).select(&labeled) {
                    Ok(snapshot) => {
                        println!("\nLatest snapshot ({}) sample:", snapshot.date);
                        for row in snapshot.rows.iter().take(sample) {
                            println!(
                                "  Cell {:>3}: LST {:.1}°C, NDVI {:.2}, {}",
                                row.record.grid_id,
                                row.record.surface_temp_c,
                                row.record.vegetation_index,
                                row.label
                            );
                        }
                    }
                    Err(e) => println!("No snapshot available: {}", e),
                }
            }

            if save_report {
                let report_path = generate_default_report_filename();
                if let Some(parent) = report_path.parent() {
                    fs::create_dir_all(parent)?;
                }
                let text = format!(
                    "{}\n{}",
                    stats.detailed_summary(),
                    checker.generate_summary(&report)
                );
                fs::write(&report_path, text)?;
                println!("\nReport written to {}", report_path.display());
            }
        }
    }

    Ok(())
}

async fn extract_families(
    config: &PipelineConfig,
    families: &[VariableKind],
    quiet: bool,
) -> Result<()> {
    let grid = Grid::from_study_area(&config.study_area);
    let window = config.window();

    println!("Extracting {} variable families...", families.len());
    println!("Window: {} to {}", window.start, window.end);
    println!("Grid: {} cells", grid.len());

    let service = HttpEoService::new(&config.service)?;
    let store = build_store(config)?;
    let writer = CsvWriter::new();

    let progress = ProgressReporter::new(families.len() as u64, "Extracting", quiet);
    for kind in families {
        progress.set_message(&format!("Extracting {}", kind));
        let table = extractor_for(*kind).extract(&service, &grid, &window).await?;

        let name = kind.artifact(&config.artifacts);
        let staged = staging_path(name);
        writer.write_variable_table(&table, &staged)?;
        store.publish(name, &staged).await?;
        progress.increment(1);
    }
    progress.finish_with_message("Extraction complete");

    Ok(())
}

async fn merge_tables(config: &PipelineConfig, quiet: bool) -> Result<()> {
    println!("Merging variable tables...");

    let store = build_store(config)?;
    let reader = TableReader::new();

    let progress = ProgressReporter::new_spinner("Fetching variable artifacts...", quiet);
    let mut tables = Vec::with_capacity(VariableKind::ALL.len());
    for kind in VariableKind::ALL {
        let path = store.fetch(kind.artifact(&config.artifacts)).await?;
        tables.push(reader.read_variable_table(&path, kind)?);
    }

    progress.set_message("Merging...");
    let merger = TableMerger::with_sentinel(config.sentinel);
    let records = merger.merge(&tables)?;
    progress.finish_with_message(&format!("Merged {} rows", records.len()));

    // Print integrity report
    let checker = IntegrityChecker::with_sentinel(config.sentinel);
    let report = checker.check(&records)?;
    println!("\n{}", checker.generate_summary(&report));

    let writer = CsvWriter::new();
    let staged = staging_path(&config.artifacts.merged);
    writer.write_merged(&records, &staged)?;
    store.publish(&config.artifacts.merged, &staged).await?;

    Ok(())
}

async fn cluster_dataset(config: &PipelineConfig, quiet: bool) -> Result<()> {
    println!("Clustering merged dataset...");

    let store = build_store(config)?;
    let reader = TableReader::new();

    let path = store.fetch(&config.artifacts.merged).await?;
    let records = reader.read_merged(&path)?;

    let progress = ProgressReporter::new_spinner(
        &format!(
            "Fitting {} clusters over {} rows...",
            config.cluster.count,
            records.len()
        ),
        quiet,
    );
    let clusterer = Clusterer::with_sentinel(config.cluster.clone(), config.sentinel);
    let outcome = clusterer.label(&records)?;
    progress.finish_with_message(&format!("Labeled {} rows", outcome.records.len()));

    println!("\nCluster summary:");
    for row in &outcome.summary {
        println!(
            "  Cluster {}: {} ({} rows, mean LST {:.1}°C)",
            row.cluster, row.label, row.count, row.mean_surface_temp
        );
    }

    let writer = CsvWriter::new();
    let staged = staging_path(&config.artifacts.labeled);
    writer.write_labeled(&outcome.records, &staged)?;
    store.publish(&config.artifacts.labeled, &staged).await?;

    let summary_staged = staging_path(&config.artifacts.cluster_summary);
    writer.write_cluster_summary(&outcome.summary, &summary_staged)?;
    store
        .publish(&config.artifacts.cluster_summary, &summary_staged)
        .await?;

    Ok(())
}

async fn select_snapshot(config: &PipelineConfig, quiet: bool) -> Result<()> {
    println!("Selecting latest snapshot...");

    let store = build_store(config)?;
    let reader = TableReader::new();

    let progress = ProgressReporter::new_spinner("Selecting latest full date...", quiet);
    let path = store.fetch(&config.artifacts.labeled).await?;
    let records = reader.read_labeled(&path)?;

    let grid = Grid::from_study_area(&config.study_area);
    let selector = SnapshotSelector::new(grid.len() as u32);
    let snapshot = selector.select(&records)?;
    progress.finish_with_message(&format!(
        "Snapshot {} holds {} cells",
        snapshot.date,
        snapshot.len()
    ));

    let writer = CsvWriter::new();
    let staged = staging_path(&config.artifacts.snapshot);
    writer.write_snapshot(&snapshot, &staged)?;
    store.publish(&config.artifacts.snapshot, &staged).await?;

    Ok(())
}

/// Store for pipeline artifacts, HTTP-backed when the config names a base
/// URL and a plain local directory otherwise.
fn build_store(config: &PipelineConfig) -> Result<Box<dyn FileStore>> {
    match &config.store.base_url {
        Some(base_url) => {
            let cache_dir = std::env::temp_dir().join("uhi-pipeline");
            let store =
                HttpStore::new(base_url, &config.store.folder.to_string_lossy(), cache_dir)?;
            Ok(Box::new(store))
        }
        None => Ok(Box::new(LocalDirStore::create(&config.store.folder)?)),
    }
}

/// Scratch path for an artifact before it is published to the store.
fn staging_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(name)
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = File::create(path)?;
            tracing_subscriber::fmt()
                .with_max_level(level)
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_max_level(level).init();
        }
    }

    Ok(())
}
