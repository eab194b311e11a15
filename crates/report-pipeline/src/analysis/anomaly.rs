//! Isolation-forest outlier detection over the numeric columns.
//!
//! Each tree isolates points of a random subsample by splitting on a random
//! feature at a random threshold. Outliers are isolated in fewer splits, so
//! a short average path length across the forest means a high anomaly score:
//!
//! ```text
//! s(x, ψ) = 2^(-E[h(x)] / c(ψ))
//! ```
//!
//! where `ψ` is the subsample size and `c(ψ)` the average path length of an
//! unsuccessful binary-search-tree lookup over `ψ` points.

use crate::config::ReportConfig;
use crate::error::ComputationError;
use crate::pipeline::StageOutcome;
use crate::types::{AnomalyRecord, Table};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Flag outlier rows of a table.
///
/// Skipped when the table has no numeric columns or fewer than
/// `config.anomaly_min_rows` rows. The `⌊contamination × rows⌋` rows with the
/// highest scores are returned in row order, each carrying the row's original
/// numeric values.
pub fn detect_anomalies(table: &Table, config: &ReportConfig) -> StageOutcome<Vec<AnomalyRecord>> {
    let columns = table.numeric_columns();
    if columns.is_empty() {
        return StageOutcome::Skipped("no numeric columns".to_string());
    }
    let rows = table.row_count();
    if rows < config.anomaly_min_rows {
        return StageOutcome::Skipped(format!(
            "need at least {} rows, found {}",
            config.anomaly_min_rows, rows
        ));
    }

    detect(table, &columns, config).into()
}

fn detect(
    table: &Table,
    columns: &[&str],
    config: &ReportConfig,
) -> Result<Vec<AnomalyRecord>, ComputationError> {
    let data = feature_matrix(table, columns)?;
    let forest = IsolationForest::fit(&data, config.n_estimators, config.max_samples, config.random_seed)?;
    let scores = forest.score_samples(&data);

    let flagged = (config.contamination * data.len() as f64).floor() as usize;
    let outliers = top_rows(&scores, flagged);
    info!(
        "Isolation forest flagged {} of {} rows ({} trees, subsample {})",
        outliers.len(),
        data.len(),
        forest.trees.len(),
        forest.subsample
    );

    outliers
        .into_iter()
        .map(|row| {
            let values = columns
                .iter()
                .map(|column| Ok((column.to_string(), table.cell(column, row)?)))
                .collect::<Result<Vec<_>, ComputationError>>()?;
            Ok(AnomalyRecord {
                row,
                score: scores[row],
                values,
            })
        })
        .collect()
}

/// Row-major matrix of the numeric columns. Missing or non-finite cells are
/// rejected.
fn feature_matrix(table: &Table, columns: &[&str]) -> Result<Vec<Vec<f64>>, ComputationError> {
    let mut data = vec![Vec::with_capacity(columns.len()); table.row_count()];
    for column in columns {
        for (row, value) in table.numeric_values(column)?.into_iter().enumerate() {
            match value {
                Some(v) if v.is_finite() => data[row].push(v),
                _ => return Err(ComputationError::NonFiniteInput(column.to_string())),
            }
        }
    }
    Ok(data)
}

/// Indices of the `k` highest scores, in ascending row order. Ties go to the
/// earlier row.
fn top_rows(scores: &[f64], k: usize) -> Vec<usize> {
    let mut ranked: Vec<usize> = (0..scores.len()).collect();
    ranked.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));
    ranked.truncate(k);
    ranked.sort_unstable();
    ranked
}

/// Average path length of an unsuccessful search in a binary search tree of
/// `n` points.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

#[derive(Debug)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn path_length(&self, point: &[f64], depth: usize) -> f64 {
        match self {
            Node::Leaf { size } => depth as f64 + average_path_length(*size),
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if point[*feature] < *threshold {
                    left.path_length(point, depth + 1)
                } else {
                    right.path_length(point, depth + 1)
                }
            }
        }
    }
}

#[derive(Debug)]
struct IsolationForest {
    trees: Vec<Node>,
    subsample: usize,
}

impl IsolationForest {
    fn fit(
        data: &[Vec<f64>],
        n_estimators: usize,
        max_samples: usize,
        seed: u64,
    ) -> Result<Self, ComputationError> {
        let n = data.len();
        if n < 2 || data.first().is_none_or(|row| row.is_empty()) {
            return Err(ComputationError::FitFailed(format!(
                "isolation forest needs at least 2 rows and 1 feature, got {} rows",
                n
            )));
        }

        let subsample = max_samples.min(n);
        let depth_limit = (subsample as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(seed);

        let trees = (0..n_estimators)
            .map(|_| {
                let sample = index::sample(&mut rng, n, subsample).into_vec();
                build_tree(data, sample, 0, depth_limit, &mut rng)
            })
            .collect();

        debug!(
            "Fitted {} trees over {} rows (depth limit {})",
            n_estimators, n, depth_limit
        );
        Ok(Self { trees, subsample })
    }

    /// Anomaly score per row, in `(0, 1]`; higher is more anomalous.
    fn score_samples(&self, data: &[Vec<f64>]) -> Vec<f64> {
        let normalizer = average_path_length(self.subsample);
        data.iter()
            .map(|point| {
                let mean_depth = self
                    .trees
                    .iter()
                    .map(|tree| tree.path_length(point, 0))
                    .sum::<f64>()
                    / self.trees.len() as f64;
                if normalizer > 0.0 {
                    2f64.powf(-mean_depth / normalizer)
                } else {
                    0.5
                }
            })
            .collect()
    }
}

fn build_tree(
    data: &[Vec<f64>],
    rows: Vec<usize>,
    depth: usize,
    depth_limit: usize,
    rng: &mut StdRng,
) -> Node {
    if depth >= depth_limit || rows.len() <= 1 {
        return Node::Leaf { size: rows.len() };
    }

    // Only features that still vary within this node can split it.
    let splittable: Vec<(usize, f64, f64)> = (0..data[rows[0]].len())
        .filter_map(|feature| {
            let (min, max) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
                (lo.min(data[r][feature]), hi.max(data[r][feature]))
            });
            (min < max).then_some((feature, min, max))
        })
        .collect();
    if splittable.is_empty() {
        return Node::Leaf { size: rows.len() };
    }

    let (feature, min, max) = splittable[rng.gen_range(0..splittable.len())];
    let threshold = rng.gen_range(min..max);
    let (left, right): (Vec<usize>, Vec<usize>) =
        rows.into_iter().partition(|&r| data[r][feature] < threshold);

    Node::Split {
        feature,
        threshold,
        left: Box::new(build_tree(data, left, depth + 1, depth_limit, rng)),
        right: Box::new(build_tree(data, right, depth + 1, depth_limit, rng)),
    }
}
