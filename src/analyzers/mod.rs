pub mod clusterer;
pub mod dataset_analyzer;

pub use clusterer::{ClusterOutcome, ClusterSummaryRow, Clusterer};
pub use dataset_analyzer::{DatasetAnalyzer, DatasetStatistics};
