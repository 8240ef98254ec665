//! Recorded Markov chains and their summaries.

use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

/// The ordered states of one Metropolis-Hastings run.
///
/// Row `i` of [`samples`](Chain::samples) is the state after step `i`. A
/// rejected proposal repeats the previous row.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    samples: Array2<f64>,
    accepted: Vec<bool>,
    names: Vec<String>,
}

/// Posterior summary of one parameter.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParameterSummary {
    /// Parameter name.
    pub name: String,
    /// Posterior mean.
    pub mean: f64,
    /// Posterior standard deviation (population form, divides by n).
    pub sd: f64,
    /// Lower end of the equal-tailed credible interval.
    pub lower: f64,
    /// Upper end of the equal-tailed credible interval.
    pub upper: f64,
}

impl Chain {
    pub(crate) fn new(samples: Array2<f64>, accepted: Vec<bool>, names: Vec<String>) -> Self {
        debug_assert_eq!(samples.nrows(), accepted.len());
        debug_assert_eq!(samples.ncols(), names.len());
        Self {
            samples,
            accepted,
            names,
        }
    }

    /// Number of recorded states.
    pub fn len(&self) -> usize {
        self.samples.nrows()
    }

    /// True when no states are recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parameter dimension.
    pub fn n_params(&self) -> usize {
        self.samples.ncols()
    }

    /// All states, shape `(len, n_params)`.
    pub fn samples(&self) -> ArrayView2<'_, f64> {
        self.samples.view()
    }

    /// State after step `i`.
    pub fn sample(&self, i: usize) -> Option<ArrayView1<'_, f64>> {
        (i < self.len()).then(|| self.samples.row(i))
    }

    /// Draws of parameter `j`.
    pub fn column(&self, j: usize) -> Option<ArrayView1<'_, f64>> {
        (j < self.n_params()).then(|| self.samples.column(j))
    }

    /// Parameter names.
    pub fn parameter_names(&self) -> &[String] {
        &self.names
    }

    /// Number of accepted proposals among the recorded steps.
    pub fn accepted(&self) -> usize {
        self.accepted.iter().filter(|&&a| a).count()
    }

    /// Whether the proposal at step `i` was accepted.
    pub fn accepted_at(&self, i: usize) -> bool {
        self.accepted.get(i).copied().unwrap_or(false)
    }

    /// Accepted proposals / recorded steps.
    pub fn acceptance_rate(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.accepted() as f64 / self.len() as f64
    }

    /// Drop the first `n` states.
    pub fn burn_in(&self, n: usize) -> Result<Chain> {
        if n >= self.len() {
            return Err(Error::InvalidParameter {
                name: "burn_in",
                message: "must be smaller than the chain length",
            });
        }
        Ok(Chain {
            samples: self.samples.slice(ndarray::s![n.., ..]).to_owned(),
            accepted: self.accepted[n..].to_vec(),
            names: self.names.clone(),
        })
    }

    /// Keep every `every`-th state, starting with the first.
    pub fn thin(&self, every: usize) -> Result<Chain> {
        if every == 0 {
            return Err(Error::InvalidParameter {
                name: "thin",
                message: "must be > 0",
            });
        }
        let keep: Vec<usize> = (0..self.len()).step_by(every).collect();
        Ok(Chain {
            samples: self.samples.select(Axis(0), &keep),
            accepted: keep.iter().map(|&i| self.accepted[i]).collect(),
            names: self.names.clone(),
        })
    }

    /// Empirical `q`-quantile of parameter `j`, linearly interpolated between
    /// order statistics.
    pub fn quantile(&self, j: usize, q: f64) -> Result<f64> {
        let column = self.column(j).ok_or(Error::DimensionMismatch {
            expected: self.n_params(),
            found: j + 1,
        })?;
        if !(0.0..=1.0).contains(&q) {
            return Err(Error::InvalidParameter {
                name: "q",
                message: "must be in [0, 1]",
            });
        }
        let mut sorted = column.to_vec();
        if sorted.is_empty() {
            return Err(Error::EmptyInput);
        }
        sorted.sort_by(|a, b| a.total_cmp(b));
        Ok(interpolate(&sorted, q))
    }

    /// Mean, sd and equal-tailed `level` credible interval per parameter.
    pub fn summarize(&self, level: f64) -> Result<Vec<ParameterSummary>> {
        if level.is_nan() || level <= 0.0 || level >= 1.0 {
            return Err(Error::InvalidParameter {
                name: "level",
                message: "must be in (0, 1)",
            });
        }
        if self.is_empty() {
            return Err(Error::EmptyInput);
        }
        let tail = (1.0 - level) / 2.0;

        Ok(self
            .samples
            .columns()
            .into_iter()
            .zip(&self.names)
            .map(|(column, name)| {
                let n = column.len() as f64;
                let mean = column.sum() / n;
                let var = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                let mut sorted = column.to_vec();
                sorted.sort_by(|a, b| a.total_cmp(b));
                ParameterSummary {
                    name: name.clone(),
                    mean,
                    sd: var.sqrt(),
                    lower: interpolate(&sorted, tail),
                    upper: interpolate(&sorted, 1.0 - tail),
                }
            })
            .collect())
    }
}

fn interpolate(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (pos - lo as f64) * (sorted[hi] - sorted[lo])
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn small_chain() -> Chain {
        Chain::new(
            array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0], [4.0, 40.0], [5.0, 50.0]],
            vec![true, false, true, true, false],
            vec!["a".into(), "b".into()],
        )
    }

    #[test]
    fn acceptance_rate_counts_flags() {
        let chain = small_chain();
        assert_eq!(chain.accepted(), 3);
        assert!((chain.acceptance_rate() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn burn_in_drops_leading_rows() {
        let chain = small_chain().burn_in(2).unwrap();
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.sample(0).unwrap().to_vec(), vec![3.0, 30.0]);
        assert!(small_chain().burn_in(5).is_err());
    }

    #[test]
    fn thin_keeps_every_other() {
        let chain = small_chain().thin(2).unwrap();
        assert_eq!(chain.column(0).unwrap().to_vec(), vec![1.0, 3.0, 5.0]);
        assert!(small_chain().thin(0).is_err());
    }

    #[test]
    fn quantiles_interpolate_linearly() {
        let chain = small_chain();
        assert_eq!(chain.quantile(0, 0.5).unwrap(), 3.0);
        assert!((chain.quantile(0, 0.1).unwrap() - 1.4).abs() < 1e-12);
        assert_eq!(chain.quantile(1, 1.0).unwrap(), 50.0);
        assert!(chain.quantile(2, 0.5).is_err());
    }

    #[test]
    fn summary_uses_population_sd() {
        let summary = small_chain().summarize(0.9).unwrap();
        assert_eq!(summary[0].name, "a");
        assert!((summary[0].mean - 3.0).abs() < 1e-12);
        assert!((summary[0].sd - 2f64.sqrt()).abs() < 1e-12);
        assert!((summary[0].lower - 1.2).abs() < 1e-12);
        assert!((summary[0].upper - 4.8).abs() < 1e-12);
        assert!(small_chain().summarize(1.0).is_err());
        assert!(small_chain().summarize(f64::NAN).is_err());
    }
}
