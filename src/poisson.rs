//! Poisson regression with log link.
//!
//! Model: `yᵢ ~ Poisson(exp(ηᵢ))`, `ηᵢ = β₀ + xᵢ·β`.
//!
//! ```text
//! log L(β) = Σᵢ yᵢ ηᵢ - exp(ηᵢ) - ln(yᵢ!)
//! ∇ log L  = Σᵢ (yᵢ - μᵢ) xᵢ
//! ∇² log L = -Σᵢ μᵢ xᵢ xᵢᵀ
//! ```
//!
//! η is clamped to [-50, 50] before exponentiating so that wild line-search
//! probes cannot overflow.

use crate::error::{Error, Result};
use crate::linalg::{ensure_finite, rows_to_array};
use crate::model::{check_params, LogLikelihood};
use ndarray::{Array1, Array2};

const ETA_CLAMP: f64 = 50.0;

/// Poisson regression over a dense design matrix.
#[derive(Debug, Clone)]
pub struct PoissonRegression {
    /// Design matrix with the intercept column already prepended when requested.
    x: Array2<f64>,
    y: Vec<u64>,
    log_factorials: Vec<f64>,
    include_intercept: bool,
}

impl PoissonRegression {
    /// Build from row-wise regressors and counts.
    pub fn new(x: &[Vec<f64>], y: Vec<u64>, include_intercept: bool) -> Result<Self> {
        let raw = rows_to_array(x)?;
        if y.len() != raw.nrows() {
            return Err(Error::DimensionMismatch {
                expected: raw.nrows(),
                found: y.len(),
            });
        }

        let x = if include_intercept {
            let mut with_const = Array2::ones((raw.nrows(), raw.ncols() + 1));
            with_const.slice_mut(ndarray::s![.., 1..]).assign(&raw);
            with_const
        } else {
            raw
        };
        if x.ncols() == 0 {
            return Err(Error::InvalidInput("no regressors".to_string()));
        }

        let log_factorials = y.iter().map(|&k| ln_factorial(k)).collect();
        Ok(Self {
            x,
            y,
            log_factorials,
            include_intercept,
        })
    }

    /// Starting point: intercept at `ln(mean(y))`, slopes at zero.
    pub fn initial_params(&self) -> Vec<f64> {
        let mut out = vec![0.0; self.x.ncols()];
        if self.include_intercept {
            let mean_y = self.y.iter().map(|&v| v as f64).sum::<f64>() / self.y.len() as f64;
            if mean_y > 0.0 {
                out[0] = mean_y.ln();
            }
        }
        out
    }

    /// Fitted means `exp(η)`.
    pub fn predict(&self, beta: &[f64]) -> Result<Vec<f64>> {
        Ok(self.means(beta)?.to_vec())
    }

    fn means(&self, beta: &[f64]) -> Result<Array1<f64>> {
        check_params(self.x.ncols(), beta)?;
        let eta = self.x.dot(&ndarray::ArrayView1::from(beta));
        Ok(eta.mapv(|e| e.clamp(-ETA_CLAMP, ETA_CLAMP).exp()))
    }
}

fn ln_factorial(k: u64) -> f64 {
    (2..=k).map(|i| (i as f64).ln()).sum()
}

impl LogLikelihood for PoissonRegression {
    fn dim(&self) -> usize {
        self.x.ncols()
    }

    fn parameter_names(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.x.ncols());
        if self.include_intercept {
            out.push("intercept".to_string());
        }
        let offset = usize::from(self.include_intercept);
        for j in offset..self.x.ncols() {
            out.push(format!("beta{}", j + 1 - offset));
        }
        out
    }

    fn log_likelihood(&self, beta: &[f64]) -> Result<f64> {
        let mu = self.means(beta)?;
        let ll: f64 = mu
            .iter()
            .zip(&self.y)
            .zip(&self.log_factorials)
            .map(|((&m, &y), &lf)| y as f64 * m.ln() - m - lf)
            .sum();
        ensure_finite(ll, "poisson log-likelihood")
    }

    fn gradient(&self, beta: &[f64]) -> Result<Vec<f64>> {
        let mu = self.means(beta)?;
        let resid: Array1<f64> = self
            .y
            .iter()
            .zip(mu.iter())
            .map(|(&y, &m)| y as f64 - m)
            .collect();
        self.x
            .t()
            .dot(&resid)
            .iter()
            .map(|&v| ensure_finite(v, "poisson gradient"))
            .collect()
    }

    fn hessian(&self, beta: &[f64]) -> Result<Array2<f64>> {
        let mu = self.means(beta)?;
        let p = self.x.ncols();
        let mut hess = Array2::<f64>::zeros((p, p));
        for (row, &m) in self.x.rows().into_iter().zip(mu.iter()) {
            for a in 0..p {
                for b in 0..p {
                    hess[[a, b]] -= m * row[a] * row[b];
                }
            }
        }
        for &v in hess.iter() {
            ensure_finite(v, "poisson hessian")?;
        }
        Ok(hess)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intercept_only_log_likelihood() {
        let x: Vec<Vec<f64>> = vec![vec![]; 3];
        let model = PoissonRegression::new(&x, vec![0, 1, 3], true).unwrap();
        assert_eq!(model.dim(), 1);
        assert_eq!(model.parameter_names(), vec!["intercept"]);

        // mu = 1 everywhere: ll = Σ (y*0 - 1 - ln y!) = -3 - ln 6
        let ll = model.log_likelihood(&[0.0]).unwrap();
        assert!((ll - (-3.0 - 6f64.ln())).abs() < 1e-12);
    }

    #[test]
    fn initial_intercept_is_log_mean() {
        let x: Vec<Vec<f64>> = vec![vec![1.0], vec![2.0]];
        let model = PoissonRegression::new(&x, vec![2, 6], true).unwrap();
        let init = model.initial_params();
        assert!((init[0] - 4f64.ln()).abs() < 1e-12);
        assert_eq!(init[1], 0.0);
        assert_eq!(model.parameter_names(), vec!["intercept", "beta1"]);
    }

    #[test]
    fn gradient_matches_finite_differences() {
        let x: Vec<Vec<f64>> = vec![vec![0.5], vec![1.0], vec![1.5], vec![2.0]];
        let model = PoissonRegression::new(&x, vec![1, 2, 2, 5], true).unwrap();
        let beta = [0.1, 0.4];
        let g = model.gradient(&beta).unwrap();
        let h = 1e-6;
        for j in 0..2 {
            let mut up = beta;
            let mut down = beta;
            up[j] += h;
            down[j] -= h;
            let numeric = (model.log_likelihood(&up).unwrap() - model.log_likelihood(&down).unwrap())
                / (2.0 * h);
            assert!((g[j] - numeric).abs() < 1e-5);
        }
    }

    #[test]
    fn extreme_parameters_stay_finite() {
        let x: Vec<Vec<f64>> = vec![vec![1.0], vec![2.0]];
        let model = PoissonRegression::new(&x, vec![1, 2], false).unwrap();
        assert!(model.log_likelihood(&[1e6]).unwrap().is_finite());
    }

    #[test]
    fn misaligned_counts() {
        let x: Vec<Vec<f64>> = vec![vec![1.0], vec![2.0]];
        assert!(PoissonRegression::new(&x, vec![1], true).is_err());
    }
}
