//! Clustering quality measures.
//!
//! | Metric | Range | Best | Needs ground truth |
//! |--------|-------|------|--------------------|
//! | [`wcss`] | [0, ∞) | lower | no |
//! | [`silhouette`] | [-1, 1] | 1 | no |
//! | [`ari`] | [-1, 1] | 1 | yes |
//!
//! [`elbow`] sweeps k and reports WCSS for each, the usual way of picking k
//! when nothing better is known: look for the bend where extra clusters stop
//! paying for themselves.
//!
//! # References
//!
//! - Rousseeuw (1987). "Silhouettes: a graphical aid to the interpretation
//!   and validation of cluster analysis"
//! - Hubert & Arabie (1985). "Comparing partitions" (ARI)

use crate::cluster::Kmeans;
use crate::error::{Error, Result};
use crate::linalg::{rows_to_array, squared_distance};
use ndarray::Array2;
use std::collections::HashMap;

/// WCSS over packed data. Labels must index rows of `centroids`.
pub(crate) fn wcss_of(data: &Array2<f64>, labels: &[usize], centroids: &Array2<f64>) -> f64 {
    data.rows()
        .into_iter()
        .zip(labels)
        .map(|(point, &c)| squared_distance(point, centroids.row(c)))
        .sum()
}

fn check_labels(n: usize, labels: &[usize]) -> Result<()> {
    if labels.len() != n {
        return Err(Error::DimensionMismatch {
            expected: n,
            found: labels.len(),
        });
    }
    Ok(())
}

/// Within-cluster sum of squared distances to the assigned centroid.
pub fn wcss(data: &[Vec<f64>], labels: &[usize], centroids: &Array2<f64>) -> Result<f64> {
    let data = rows_to_array(data)?;
    check_labels(data.nrows(), labels)?;
    if data.ncols() != centroids.ncols() {
        return Err(Error::DimensionMismatch {
            expected: centroids.ncols(),
            found: data.ncols(),
        });
    }
    if let Some(&bad) = labels.iter().find(|&&c| c >= centroids.nrows()) {
        return Err(Error::InvalidInput(format!(
            "label {bad} has no centroid (k = {})",
            centroids.nrows()
        )));
    }
    Ok(wcss_of(&data, labels, centroids))
}

/// Mean silhouette coefficient.
///
/// For point i with mean intra-cluster distance `a` and smallest mean
/// distance to another cluster `b`, `s = (b - a) / max(a, b)`. Points in
/// singleton clusters score 0.
pub fn silhouette(data: &[Vec<f64>], labels: &[usize]) -> Result<f64> {
    let data = rows_to_array(data)?;
    let n = data.nrows();
    check_labels(n, labels)?;

    let mut sizes: HashMap<usize, usize> = HashMap::new();
    for &c in labels {
        *sizes.entry(c).or_insert(0) += 1;
    }
    if sizes.len() < 2 {
        return Err(Error::InvalidInput(
            "silhouette needs at least 2 clusters".to_string(),
        ));
    }

    let mut total = 0.0;
    for i in 0..n {
        let own = labels[i];
        if sizes[&own] == 1 {
            continue;
        }

        let mut sums: HashMap<usize, f64> = HashMap::new();
        for j in 0..n {
            if i == j {
                continue;
            }
            let d = squared_distance(data.row(i), data.row(j)).sqrt();
            *sums.entry(labels[j]).or_insert(0.0) += d;
        }

        let a = sums.get(&own).copied().unwrap_or(0.0) / (sizes[&own] - 1) as f64;
        let b = sums
            .iter()
            .filter(|(&c, _)| c != own)
            .map(|(c, &s)| s / sizes[c] as f64)
            .fold(f64::INFINITY, f64::min);

        let denom = a.max(b);
        if denom > 0.0 {
            total += (b - a) / denom;
        }
    }

    Ok(total / n as f64)
}

/// WCSS of a seeded k-means fit for each requested k.
pub fn elbow(data: &[Vec<f64>], ks: &[usize], seed: u64) -> Result<Vec<(usize, f64)>> {
    ks.iter()
        .map(|&k| {
            let fit = Kmeans::new(k).with_seed(seed).fit(data)?;
            Ok((k, fit.wcss))
        })
        .collect()
}

/// Adjusted Rand Index between two clusterings.
///
/// ARI is the corrected-for-chance version of the Rand Index.
/// A value of 0 indicates random clustering, 1 indicates perfect agreement.
/// Label values need not match between the two clusterings.
pub fn ari(pred: &[usize], truth: &[usize]) -> Result<f64> {
    if pred.is_empty() {
        return Err(Error::EmptyInput);
    }
    check_labels(pred.len(), truth)?;

    let n = pred.len();
    let mut joint: HashMap<(usize, usize), usize> = HashMap::new();
    for (&p, &t) in pred.iter().zip(truth) {
        *joint.entry((p, t)).or_insert(0) += 1;
    }

    // Row sums (a_i) and column sums (b_j)
    let mut row_sums = HashMap::new();
    let mut col_sums = HashMap::new();
    for (&(p, t), &count) in &joint {
        *row_sums.entry(p).or_insert(0usize) += count;
        *col_sums.entry(t).or_insert(0usize) += count;
    }

    let sum_comb_ij: f64 = joint.values().map(|&c| comb2(c) as f64).sum();
    let sum_comb_a: f64 = row_sums.values().map(|&a| comb2(a) as f64).sum();
    let sum_comb_b: f64 = col_sums.values().map(|&b| comb2(b) as f64).sum();
    let comb_n = comb2(n) as f64;
    if comb_n == 0.0 {
        return Ok(1.0);
    }

    let expected = sum_comb_a * sum_comb_b / comb_n;
    let max_index = (sum_comb_a + sum_comb_b) / 2.0;

    let denom = max_index - expected;
    if denom.abs() < 1e-10 {
        return Ok(1.0);
    }

    Ok((sum_comb_ij - expected) / denom)
}

fn comb2(n: usize) -> usize {
    if n < 2 {
        0
    } else {
        n * (n - 1) / 2
    }
}
