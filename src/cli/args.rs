use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "uhi-pipeline")]
#[command(about = "Urban heat island grid analytics pipeline")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Configuration file (TOML)")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Suppress progress bars")]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline: extract, merge, cluster, snapshot
    Run {
        #[arg(long, help = "Reuse stored variable artifacts instead of extracting")]
        skip_extract: bool,
    },

    /// Extract variable tables from the earth-observation service
    Extract {
        #[arg(
            short,
            long,
            help = "Single family to extract (lst, ndvi, rainfall, wind, humidity, isa) [default: all]"
        )]
        family: Option<String>,
    },

    /// Merge the six variable artifacts into the merged dataset
    Merge,

    /// Cluster the merged dataset into severity labels
    Cluster,

    /// Select the latest-date snapshot from the labeled dataset
    Snapshot,

    /// Export map overlays from the latest snapshot as GeoJSON
    Layers {
        #[arg(
            short,
            long,
            help = "Output directory [default: exports/uhi-layers-{YYMMDD}]"
        )]
        output: Option<PathBuf>,

        #[arg(
            short,
            long,
            help = "Single layer to export (lst, ndvi, rainfall, humidity, isa, wind, uhi) [default: all]"
        )]
        layer: Option<String>,
    },

    /// Relabel one grid cell from adjusted inputs
    WhatIf {
        #[arg(short = 'g', long, help = "Grid cell index")]
        cell: u32,

        #[arg(long, help = "Surface temperature in °C")]
        lst: Option<f64>,

        #[arg(long, help = "Vegetation index (0-1)")]
        ndvi: Option<f64>,

        #[arg(long, help = "Rainfall in mm")]
        rainfall: Option<f64>,

        #[arg(long, help = "Relative humidity in %")]
        humidity: Option<f64>,

        #[arg(long, help = "Wind speed in m/s")]
        wind: Option<f64>,

        #[arg(long, help = "Impervious surface fraction (0-1)")]
        isa: Option<f64>,
    },

    /// Summarize the labeled dataset and check its integrity
    Info {
        #[arg(short, long, default_value = "10", help = "Snapshot rows to print")]
        sample: usize,

        #[arg(long, help = "Also write the report to reports/uhi-report-{YYMMDD}.txt")]
        save_report: bool,
    },
}
