//! K-means clustering.
//!
//! Partitions data into k clusters by minimizing **within-cluster sum of squares**
//! (WCSS). The foundational clustering algorithm, dating to 1957 (Lloyd).
//!
//! # The Objective
//!
//! ```text
//! WCSS = Σₖ Σᵢ∈Cₖ ||xᵢ - μₖ||²
//! ```
//!
//! # Lloyd's Algorithm
//!
//! 1. Initialize k centroids: k distinct observations drawn without replacement
//! 2. **Assign**: Each point → nearest centroid (lowest index wins ties)
//! 3. **Update**: Each centroid → mean of assigned points
//! 4. Repeat until no centroid moves more than `tol`, or `max_iter` passes
//!
//! **Why it converges**: each half-step either decreases WCSS or leaves it
//! unchanged, so the WCSS reported by [`KmeansStep`] is non-increasing.
//!
//! # Empty Clusters
//!
//! A cluster that receives no points keeps its previous centroid. Its mean is
//! undefined, and keeping the old value is the only choice that leaves WCSS
//! untouched and the run deterministic.
//!
//! # Tracing
//!
//! [`Kmeans::trace`] returns every intermediate `(labels, centroids)` pair as
//! a lazy sequence. It can be iterated any number of times; each pass replays
//! the same run from the same initial centroids.

use super::traits::Clustering;
use crate::error::{Error, Result};
use crate::linalg::{rows_to_array, squared_distance};
use crate::metrics::wcss_of;
use ndarray::Array2;
use rand::prelude::*;
use tracing::{debug, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// K-means clustering algorithm.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Kmeans {
    /// Number of clusters.
    k: usize,
    /// Maximum iterations.
    max_iter: usize,
    /// Convergence tolerance on the largest centroid shift.
    tol: f64,
    /// Random seed.
    seed: Option<u64>,
}

/// One Lloyd iteration: the assignment and the centroids recomputed from it.
#[derive(Debug, Clone, PartialEq)]
pub struct KmeansStep {
    /// 1-based iteration number.
    pub iteration: usize,
    /// Label of every observation under the previous centroids.
    pub labels: Vec<usize>,
    /// Centroids recomputed from `labels`.
    pub centroids: Array2<f64>,
    /// Largest Euclidean distance any centroid moved.
    pub shift: f64,
    /// WCSS of `labels` against `centroids`.
    pub wcss: f64,
    /// Clusters that received no points and kept their old centroid.
    pub empty_clusters: Vec<usize>,
}

/// Final state of a k-means run.
#[derive(Debug, Clone, PartialEq)]
pub struct KmeansFit {
    /// Cluster label per observation.
    pub labels: Vec<usize>,
    /// Centroids, shape `(k, d)`.
    pub centroids: Array2<f64>,
    /// Iterations performed.
    pub iterations: usize,
    /// Whether the shift fell below tolerance before `max_iter`.
    pub converged: bool,
    /// Within-cluster sum of squares.
    pub wcss: f64,
}

/// A replayable k-means run.
///
/// Holds the data and the initial centroids; [`KmeansTrace::iter`] lazily
/// yields one [`KmeansStep`] per iteration.
#[derive(Debug, Clone)]
pub struct KmeansTrace {
    data: Array2<f64>,
    initial: Array2<f64>,
    max_iter: usize,
    tol: f64,
}

/// Iterator over the steps of a [`KmeansTrace`].
#[derive(Debug, Clone)]
pub struct KmeansSteps<'a> {
    data: &'a Array2<f64>,
    centroids: Array2<f64>,
    iteration: usize,
    max_iter: usize,
    tol: f64,
    done: bool,
}

impl Kmeans {
    /// Create a new K-means clusterer.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iter: 100,
            tol: 1e-6,
            seed: None,
        }
    }

    /// Set maximum iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set convergence tolerance. Must be positive.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Maximum iterations.
    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    /// Convergence tolerance.
    pub fn tol(&self) -> f64 {
        self.tol
    }

    fn validate(&self, n: usize) -> Result<()> {
        if self.k == 0 {
            return Err(Error::InvalidParameter {
                name: "k",
                message: "must be > 0",
            });
        }
        if self.max_iter == 0 {
            return Err(Error::InvalidParameter {
                name: "max_iter",
                message: "must be > 0",
            });
        }
        if !self.tol.is_finite() || self.tol <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "tol",
                message: "must be finite and > 0",
            });
        }
        if self.k > n {
            return Err(Error::InvalidClusterCount {
                requested: self.k,
                n_items: n,
            });
        }
        Ok(())
    }

    /// Initialize centroids from k distinct observations, uniformly at random.
    fn init_centroids<R: Rng + ?Sized>(&self, data: &Array2<f64>, rng: &mut R) -> Array2<f64> {
        let picks = rand::seq::index::sample(rng, data.nrows(), self.k);
        let mut centroids = Array2::zeros((self.k, data.ncols()));
        for (c, idx) in picks.iter().enumerate() {
            centroids.row_mut(c).assign(&data.row(idx));
        }
        centroids
    }

    /// Prepare a replayable run using the configured seed.
    pub fn trace(&self, data: &[Vec<f64>]) -> Result<KmeansTrace> {
        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };
        self.trace_with_rng(data, &mut rng)
    }

    /// Prepare a replayable run, drawing the initial centroids from `rng`.
    pub fn trace_with_rng<R: Rng + ?Sized>(
        &self,
        data: &[Vec<f64>],
        rng: &mut R,
    ) -> Result<KmeansTrace> {
        if data.is_empty() {
            return Err(Error::EmptyInput);
        }
        self.validate(data.len())?;
        let data = rows_to_array(data)?;
        let initial = self.init_centroids(&data, rng);

        Ok(KmeansTrace {
            data,
            initial,
            max_iter: self.max_iter,
            tol: self.tol,
        })
    }

    /// Run to convergence using the configured seed.
    pub fn fit(&self, data: &[Vec<f64>]) -> Result<KmeansFit> {
        self.trace(data)?.fit()
    }

    /// Run to convergence, drawing the initial centroids from `rng`.
    pub fn fit_with_rng<R: Rng + ?Sized>(&self, data: &[Vec<f64>], rng: &mut R) -> Result<KmeansFit> {
        self.trace_with_rng(data, rng)?.fit()
    }
}

impl KmeansTrace {
    /// Start (or restart) the sequence of iterations.
    pub fn iter(&self) -> KmeansSteps<'_> {
        KmeansSteps {
            data: &self.data,
            centroids: self.initial.clone(),
            iteration: 0,
            max_iter: self.max_iter,
            tol: self.tol,
            done: false,
        }
    }

    /// Centroids before the first iteration.
    pub fn initial_centroids(&self) -> &Array2<f64> {
        &self.initial
    }

    /// Observations, shape `(n, d)`.
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// Drain the sequence and report the final state.
    pub fn fit(&self) -> Result<KmeansFit> {
        let last = self.iter().last().ok_or(Error::InvalidParameter {
            name: "max_iter",
            message: "must be > 0",
        })?;
        let converged = last.shift <= self.tol;
        debug!(
            iterations = last.iteration,
            converged,
            wcss = last.wcss,
            "kmeans finished"
        );

        Ok(KmeansFit {
            labels: last.labels,
            centroids: last.centroids,
            iterations: last.iteration,
            converged,
            wcss: last.wcss,
        })
    }
}

impl<'a> IntoIterator for &'a KmeansTrace {
    type Item = KmeansStep;
    type IntoIter = KmeansSteps<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Iterator for KmeansSteps<'_> {
    type Item = KmeansStep;

    fn next(&mut self) -> Option<KmeansStep> {
        if self.done || self.iteration >= self.max_iter {
            return None;
        }
        self.iteration += 1;

        let labels = assign(self.data, &self.centroids);
        let (new_centroids, empty_clusters) = update(self.data, &labels, &self.centroids);
        if !empty_clusters.is_empty() {
            warn!(
                iteration = self.iteration,
                clusters = ?empty_clusters,
                "empty clusters keep their previous centroid"
            );
        }

        let shift = self
            .centroids
            .rows()
            .into_iter()
            .zip(new_centroids.rows())
            .map(|(a, b)| squared_distance(a, b).sqrt())
            .fold(0.0, f64::max);
        let wcss = wcss_of(self.data, &labels, &new_centroids);
        debug!(iteration = self.iteration, shift, wcss, "kmeans step");

        self.centroids = new_centroids.clone();
        self.done = shift <= self.tol;

        Some(KmeansStep {
            iteration: self.iteration,
            labels,
            centroids: new_centroids,
            shift,
            wcss,
            empty_clusters,
        })
    }
}

/// Index of the nearest centroid; the first one wins ties.
fn nearest(point: ndarray::ArrayView1<'_, f64>, centroids: &Array2<f64>) -> usize {
    let mut best_cluster = 0;
    let mut best_dist = f64::INFINITY;
    for (k, centroid) in centroids.rows().into_iter().enumerate() {
        let dist = squared_distance(point, centroid);
        if dist < best_dist {
            best_dist = dist;
            best_cluster = k;
        }
    }
    best_cluster
}

/// Assignment step, parallel when the feature is enabled.
#[cfg(feature = "parallel")]
fn assign(data: &Array2<f64>, centroids: &Array2<f64>) -> Vec<usize> {
    (0..data.nrows())
        .into_par_iter()
        .map(|i| nearest(data.row(i), centroids))
        .collect()
}

/// Assignment step.
#[cfg(not(feature = "parallel"))]
fn assign(data: &Array2<f64>, centroids: &Array2<f64>) -> Vec<usize> {
    data.rows()
        .into_iter()
        .map(|point| nearest(point, centroids))
        .collect()
}

/// Update step. Returns the new centroids and the clusters left empty.
fn update(
    data: &Array2<f64>,
    labels: &[usize],
    previous: &Array2<f64>,
) -> (Array2<f64>, Vec<usize>) {
    let k = previous.nrows();
    let d = previous.ncols();
    let mut new_centroids = Array2::zeros((k, d));
    let mut counts = vec![0usize; k];

    for (i, &c) in labels.iter().enumerate() {
        for j in 0..d {
            new_centroids[[c, j]] += data[[i, j]];
        }
        counts[c] += 1;
    }

    let mut empty = Vec::new();
    for c in 0..k {
        if counts[c] > 0 {
            for j in 0..d {
                new_centroids[[c, j]] /= counts[c] as f64;
            }
        } else {
            new_centroids.row_mut(c).assign(&previous.row(c));
            empty.push(c);
        }
    }

    (new_centroids, empty)
}

/// Assign new observations to already fitted centroids.
pub fn predict(centroids: &Array2<f64>, data: &[Vec<f64>]) -> Result<Vec<usize>> {
    if centroids.nrows() == 0 {
        return Err(Error::EmptyInput);
    }
    let data = rows_to_array(data)?;
    if data.ncols() != centroids.ncols() {
        return Err(Error::DimensionMismatch {
            expected: centroids.ncols(),
            found: data.ncols(),
        });
    }
    Ok(assign(&data, centroids))
}

impl Clustering for Kmeans {
    fn fit_predict(&self, data: &[Vec<f64>]) -> Result<Vec<usize>> {
        Ok(self.fit(data)?.labels)
    }

    fn n_clusters(&self) -> usize {
        self.k
    }
}
