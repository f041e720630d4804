use linfa::traits::{Fit, Predict};
use linfa::DatasetBase;
use linfa_clustering::KMeans;
use ndarray::Array2;
use rand_xoshiro::rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use std::collections::{BTreeSet, HashMap};
use tracing::info;

use crate::config::ClusterConfig;
use crate::error::{PipelineError, Result};
use crate::models::{LabeledRecord, MergedRecord, SeverityLabel, FEATURE_COLUMNS};
use crate::utils::constants::SENTINEL;

/// Per-cluster roll-up for the summary artifact.
#[derive(Debug, Clone)]
pub struct ClusterSummaryRow {
    pub cluster: usize,
    pub label: SeverityLabel,
    pub count: usize,
    pub mean_surface_temp: f64,
}

#[derive(Debug, Clone)]
pub struct ClusterOutcome {
    pub records: Vec<LabeledRecord>,
    pub summary: Vec<ClusterSummaryRow>,
}

/// Severity labeling of merged rows by k-means.
///
/// Features are imputed (sentinel to column mean) and z-score standardized
/// before clustering; the stored records keep their raw values untouched.
/// Clusters are ranked by mean surface temperature, descending, and ranks
/// map onto the five-level severity vocabulary. The mapping is recomputed
/// from each run's cluster means, so cluster ids carry no meaning across
/// runs even though the seeded k-means itself is deterministic.
pub struct Clusterer {
    config: ClusterConfig,
    sentinel: f64,
}

impl Clusterer {
    pub fn new(config: ClusterConfig) -> Self {
        Self {
            config,
            sentinel: SENTINEL,
        }
    }

    pub fn with_sentinel(config: ClusterConfig, sentinel: f64) -> Self {
        Self { config, sentinel }
    }

    pub fn label(&self, records: &[MergedRecord]) -> Result<ClusterOutcome> {
        if records.is_empty() {
            return Err(PipelineError::MissingData(
                "merged dataset is empty".to_string(),
            ));
        }

        let imputed = self.impute(records);
        let scaled = standardize(&imputed);

        let n = records.len();
        let matrix = Array2::from_shape_vec((n, FEATURE_COLUMNS.len()), flatten(&scaled))
            .map_err(|e| PipelineError::Clustering(e.to_string()))?;

        info!(
            "Clustering {} records into {} groups (seed {})",
            n, self.config.count, self.config.seed
        );

        let rng = Xoshiro256Plus::seed_from_u64(self.config.seed);
        let dataset = DatasetBase::from(matrix);
        let model = KMeans::params_with_rng(self.config.count, rng)
            .max_n_iterations(self.config.max_iterations)
            .tolerance(self.config.tolerance)
            .fit(&dataset)
            .map_err(|e| PipelineError::Clustering(e.to_string()))?;

        let assigned = model.predict(dataset);
        let clusters: Vec<usize> = assigned.targets().iter().copied().collect();

        let label_map = self.rank_clusters(&clusters, &scaled)?;

        let mut labeled = Vec::with_capacity(n);
        for (record, &cluster) in records.iter().zip(&clusters) {
            labeled.push(LabeledRecord {
                record: record.clone(),
                cluster,
                label: label_map[&cluster],
            });
        }

        let summary = self.summarize(&labeled, &imputed);
        Ok(ClusterOutcome {
            records: labeled,
            summary,
        })
    }

    /// Replace sentinels with the column mean over usable values. A column
    /// with no usable value at all imputes to zero.
    fn impute(&self, records: &[MergedRecord]) -> Vec<[f64; 9]> {
        let mut sums = [0.0; 9];
        let mut counts = [0usize; 9];
        for record in records {
            for (i, value) in record.feature_values().iter().enumerate() {
                if *value != self.sentinel {
                    sums[i] += value;
                    counts[i] += 1;
                }
            }
        }

        let mut means = [0.0; 9];
        for i in 0..9 {
            if counts[i] > 0 {
                means[i] = sums[i] / counts[i] as f64;
            }
        }

        records
            .iter()
            .map(|record| {
                let mut values = record.feature_values();
                for (i, value) in values.iter_mut().enumerate() {
                    if *value == self.sentinel {
                        *value = means[i];
                    }
                }
                values
            })
            .collect()
    }

    /// Order clusters by mean surface temperature, descending, and map each
    /// to its vocabulary label.
    fn rank_clusters(
        &self,
        clusters: &[usize],
        scaled: &[[f64; 9]],
    ) -> Result<HashMap<usize, SeverityLabel>> {
        let mut temp_sums: HashMap<usize, (f64, usize)> = HashMap::new();
        for (&cluster, row) in clusters.iter().zip(scaled) {
            let entry = temp_sums.entry(cluster).or_insert((0.0, 0));
            entry.0 += row[0];
            entry.1 += 1;
        }

        let present: BTreeSet<usize> = clusters.iter().copied().collect();
        let mut ordered: Vec<(usize, f64)> = present
            .iter()
            .map(|&cluster| {
                let (sum, count) = temp_sums[&cluster];
                (cluster, sum / count as f64)
            })
            .collect();
        ordered.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let mut label_map = HashMap::new();
        for (rank, (cluster, _)) in ordered.iter().enumerate() {
            label_map.insert(*cluster, SeverityLabel::from_rank(rank, ordered.len())?);
        }
        Ok(label_map)
    }

    /// Roll-up in label-frequency order, mean surface temperature in raw
    /// units (after imputation).
    fn summarize(&self, labeled: &[LabeledRecord], imputed: &[[f64; 9]]) -> Vec<ClusterSummaryRow> {
        let mut rollup: HashMap<usize, (SeverityLabel, usize, f64)> = HashMap::new();
        for (record, row) in labeled.iter().zip(imputed) {
            let entry = rollup
                .entry(record.cluster)
                .or_insert((record.label, 0, 0.0));
            entry.1 += 1;
            entry.2 += row[0];
        }

        let mut summary: Vec<ClusterSummaryRow> = rollup
            .into_iter()
            .map(|(cluster, (label, count, temp_sum))| ClusterSummaryRow {
                cluster,
                label,
                count,
                mean_surface_temp: temp_sum / count as f64,
            })
            .collect();
        summary.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.cluster.cmp(&b.cluster)));
        summary
    }
}

fn standardize(rows: &[[f64; 9]]) -> Vec<[f64; 9]> {
    let n = rows.len() as f64;
    let mut means = [0.0; 9];
    for row in rows {
        for i in 0..9 {
            means[i] += row[i];
        }
    }
    for mean in &mut means {
        *mean /= n;
    }

    let mut stds = [0.0; 9];
    for row in rows {
        for i in 0..9 {
            stds[i] += (row[i] - means[i]).powi(2);
        }
    }
    for std in &mut stds {
        *std = (*std / n).sqrt();
    }

    rows.iter()
        .map(|row| {
            let mut scaled = [0.0; 9];
            for i in 0..9 {
                scaled[i] = if stds[i] > 0.0 {
                    (row[i] - means[i]) / stds[i]
                } else {
                    0.0
                };
            }
            scaled
        })
        .collect()
}

fn flatten(rows: &[[f64; 9]]) -> Vec<f64> {
    rows.iter().flat_map(|row| row.iter().copied()).collect()
}
