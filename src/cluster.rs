//! Literal clustering: partitions a literal value population into homogeneous
//! clusters per datatype family.
//!
//! Numeric, date/time, and date-fragment literals are embedded on the real
//! line and split with 1-D k-means; strings are clustered on character length.
//! Model selection walks k upward and stops at the elbow of the
//! within-cluster variance curve, so a unimodal population stays a single
//! cluster.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ClusterError;
use crate::term::{NodeId, XSD_NUMERIC, XSD_STRING, is_clusterable, is_temporal};

/// Largest number of clusters considered during model selection.
const MAX_CLUSTERS: usize = 4;

/// Summary statistics of a numeric (or temporal, via its numeric embedding)
/// cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericCluster {
    /// Cluster mean.
    pub mean: f64,
    /// Cluster standard deviation.
    pub std_dev: f64,
    /// Smallest member value.
    pub min: f64,
    /// Largest member value.
    pub max: f64,
    /// Number of members.
    pub count: usize,
}

impl NumericCluster {
    /// Stable textual form used in pattern hashing.
    pub fn descriptor(&self) -> String {
        format!("[{:.6},{:.6}]n{}", self.min, self.max, self.count)
    }
}

impl std::fmt::Display for NumericCluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "mean={:.3} std={:.3} range=[{:.3}, {:.3}] n={}",
            self.mean, self.std_dev, self.min, self.max, self.count
        )
    }
}

/// Summary of a string cluster: shared prefix and length band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringCluster {
    /// Longest prefix (in characters) shared by all members.
    pub common_prefix: String,
    /// Shortest member length.
    pub min_len: usize,
    /// Longest member length.
    pub max_len: usize,
    /// Number of members.
    pub count: usize,
}

impl StringCluster {
    /// Stable textual form used in pattern hashing.
    pub fn descriptor(&self) -> String {
        format!(
            "\"{}\"[{},{}]n{}",
            self.common_prefix, self.min_len, self.max_len, self.count
        )
    }
}

impl std::fmt::Display for StringCluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "prefix={:?} len=[{}, {}] n={}",
            self.common_prefix, self.min_len, self.max_len, self.count
        )
    }
}

/// A computed cluster summary, numeric or textual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClusterSummary {
    /// Numeric/temporal family.
    Numeric(NumericCluster),
    /// String family.
    String(StringCluster),
}

impl ClusterSummary {
    /// Stable textual form used in pattern hashing.
    pub fn descriptor(&self) -> String {
        match self {
            ClusterSummary::Numeric(c) => c.descriptor(),
            ClusterSummary::String(c) => c.descriptor(),
        }
    }
}

/// Partition a literal population into clusters.
///
/// `values` are lexical forms and `ids` the matching literal node IDs; the two
/// slices run in parallel. Values that do not parse under the datatype's
/// embedding are dropped from the population (data sparsity, not an error).
pub fn compute_clusters(
    datatype: &str,
    values: &[String],
    ids: &[NodeId],
) -> Result<Vec<(Vec<NodeId>, ClusterSummary)>, ClusterError> {
    if !is_clusterable(datatype) {
        return Err(ClusterError::UnsupportedDatatype {
            datatype: datatype.to_string(),
        });
    }
    if values.is_empty() {
        return Err(ClusterError::EmptyPopulation {
            datatype: datatype.to_string(),
        });
    }

    if XSD_STRING.contains(&datatype) {
        let embedded: Vec<(f64, usize)> = values
            .iter()
            .enumerate()
            .map(|(i, v)| (v.chars().count() as f64, i))
            .collect();
        let clusters = kmeans_1d(&embedded);
        Ok(clusters
            .into_iter()
            .map(|members| {
                let member_values: Vec<&str> =
                    members.iter().map(|&(_, i)| values[i].as_str()).collect();
                let summary = ClusterSummary::String(summarize_strings(&member_values));
                (members.iter().map(|&(_, i)| ids[i]).collect(), summary)
            })
            .collect())
    } else {
        let embed: fn(&str) -> Option<f64> = if is_temporal(datatype) {
            temporal_key
        } else {
            debug_assert!(XSD_NUMERIC.contains(&datatype));
            |v| v.trim().parse::<f64>().ok()
        };

        let embedded: Vec<(f64, usize)> = values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| embed(v).map(|x| (x, i)))
            .collect();
        if embedded.is_empty() {
            return Err(ClusterError::EmptyPopulation {
                datatype: datatype.to_string(),
            });
        }

        let clusters = kmeans_1d(&embedded);
        Ok(clusters
            .into_iter()
            .map(|members| {
                let summary =
                    ClusterSummary::Numeric(summarize_numbers(&members));
                (members.iter().map(|&(_, i)| ids[i]).collect(), summary)
            })
            .collect())
    }
}

/// Embed a temporal lexical form (date, dateTime, gYear, ...) on the real line
/// by folding its digit groups most-significant first. The embedding is
/// monotone in component order, which is all clustering needs.
fn temporal_key(lexical: &str) -> Option<f64> {
    static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("digits regex"));

    let mut key: Option<f64> = None;
    for group in DIGITS.find_iter(lexical) {
        let value: f64 = group.as_str().parse().ok()?;
        key = Some(match key {
            None => value,
            Some(k) => k * 100.0 + value,
        });
    }
    key
}

/// A k+1 model must cut within-cluster variance to this fraction of the
/// k model's to be preferred; otherwise the extra centroid is noise. Halving
/// a uniform population cuts its variance to exactly a quarter, so the
/// threshold sits strictly below 0.25 to keep uniform data in one cluster.
const ELBOW_FACTOR: f64 = 0.2;

/// 1-D k-means over (value, tag) points with deterministic quantile
/// initialization; returns the member lists of the selected model.
///
/// Model selection walks k upward and stops at the elbow: the first k whose
/// successor no longer collapses the within-cluster variance.
fn kmeans_1d(points: &[(f64, usize)]) -> Vec<Vec<(f64, usize)>> {
    let mut sorted: Vec<(f64, usize)> = points.to_vec();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));
    let n = sorted.len();

    let mut selected = run_kmeans(&sorted, 1);
    let mut selected_w = within_total(&selected);
    for k in 2..=MAX_CLUSTERS.min(n) {
        if selected_w == 0.0 {
            break;
        }
        let next = run_kmeans(&sorted, k);
        let next_w = within_total(&next);
        if next_w > ELBOW_FACTOR * selected_w {
            break;
        }
        selected = next;
        selected_w = next_w;
    }

    selected.into_iter().filter(|c| !c.is_empty()).collect()
}

fn within_total(clusters: &[Vec<(f64, usize)>]) -> f64 {
    clusters.iter().map(|c| within_variance(c)).sum()
}

fn run_kmeans(sorted: &[(f64, usize)], k: usize) -> Vec<Vec<(f64, usize)>> {
    let n = sorted.len();
    // Quantile initialization over the sorted values.
    let mut centroids: Vec<f64> = (0..k)
        .map(|i| sorted[(i * n + n / 2) / k.max(1)].0)
        .collect();

    let mut assignment = vec![0usize; n];
    for _ in 0..100 {
        let mut changed = false;
        for (i, &(x, _)) in sorted.iter().enumerate() {
            let nearest = centroids
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| (x - *a).abs().total_cmp(&(x - *b).abs()))
                .map(|(j, _)| j)
                .unwrap_or(0);
            if assignment[i] != nearest {
                assignment[i] = nearest;
                changed = true;
            }
        }
        if !changed {
            break;
        }
        for (j, centroid) in centroids.iter_mut().enumerate() {
            let members: Vec<f64> = sorted
                .iter()
                .zip(&assignment)
                .filter(|&(_, &a)| a == j)
                .map(|(&(x, _), _)| x)
                .collect();
            if !members.is_empty() {
                *centroid = members.iter().sum::<f64>() / members.len() as f64;
            }
        }
    }

    let mut clusters: Vec<Vec<(f64, usize)>> = vec![Vec::new(); k];
    for (i, &point) in sorted.iter().enumerate() {
        clusters[assignment[i]].push(point);
    }
    clusters
}

fn within_variance(cluster: &[(f64, usize)]) -> f64 {
    if cluster.len() < 2 {
        return 0.0;
    }
    let mean = cluster.iter().map(|&(x, _)| x).sum::<f64>() / cluster.len() as f64;
    cluster.iter().map(|&(x, _)| (x - mean).powi(2)).sum()
}

fn summarize_numbers(members: &[(f64, usize)]) -> NumericCluster {
    let count = members.len();
    let mean = members.iter().map(|&(x, _)| x).sum::<f64>() / count as f64;
    let var = members.iter().map(|&(x, _)| (x - mean).powi(2)).sum::<f64>() / count as f64;
    let min = members
        .iter()
        .map(|&(x, _)| x)
        .fold(f64::INFINITY, f64::min);
    let max = members
        .iter()
        .map(|&(x, _)| x)
        .fold(f64::NEG_INFINITY, f64::max);
    NumericCluster {
        mean,
        std_dev: var.sqrt(),
        min,
        max,
        count,
    }
}

fn summarize_strings(members: &[&str]) -> StringCluster {
    let common_prefix = members
        .iter()
        .skip(1)
        .fold(members[0].to_string(), |prefix, s| {
            prefix
                .chars()
                .zip(s.chars())
                .take_while(|(a, b)| a == b)
                .map(|(a, _)| a)
                .collect()
        });
    let lens: Vec<usize> = members.iter().map(|s| s.chars().count()).collect();
    StringCluster {
        common_prefix,
        min_len: lens.iter().copied().min().unwrap_or(0),
        max_len: lens.iter().copied().max().unwrap_or(0),
        count: members.len(),
    }
}
