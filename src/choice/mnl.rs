//! Multinomial logit log-likelihood.
//!
//! For task g with alternatives j ∈ g and linear utilities `sⱼ = xⱼ·β`:
//!
//! ```text
//! log P(j) = sⱼ - logsumexp(s_g)
//! log L(β) = Σ_g log P(chosen_g)
//! ```
//!
//! Derivatives, with `x̄_g = Σⱼ P(j) xⱼ`:
//!
//! ```text
//! ∇ log L  =  Σ_g (x_chosen - x̄_g)
//! ∇² log L = -Σ_g Σⱼ P(j) (xⱼ - x̄_g)(xⱼ - x̄_g)ᵀ
//! ```
//!
//! The Hessian is negative semi-definite everywhere, so the log-likelihood is
//! concave and any stationary point is the global maximum.

use super::data::ChoiceData;
use crate::error::Result;
use crate::linalg::{ensure_finite, logsumexp, mat_vec};
use crate::model::{check_params, LogLikelihood};
use ndarray::{Array1, Array2};

/// Multinomial logit model over validated choice data.
#[derive(Debug, Clone)]
pub struct MultinomialLogit {
    data: ChoiceData,
}

impl MultinomialLogit {
    /// Wrap validated choice data.
    pub fn new(data: ChoiceData) -> Self {
        Self { data }
    }

    /// Underlying data.
    pub fn data(&self) -> &ChoiceData {
        &self.data
    }

    fn utilities(&self, beta: &[f64]) -> Result<Array1<f64>> {
        check_params(self.data.n_features(), beta)?;
        mat_vec(self.data.x(), beta)
    }

    /// Log-probability of every alternative, one vector per group.
    fn group_log_probs(&self, beta: &[f64]) -> Result<Vec<Vec<f64>>> {
        let s = self.utilities(beta)?;
        self.data
            .groups()
            .iter()
            .map(|g| {
                let util: Vec<f64> = g.rows.iter().map(|&r| s[r]).collect();
                let lse = ensure_finite(logsumexp(&util), "log-sum-exp of utilities")?;
                Ok(util.iter().map(|&u| u - lse).collect())
            })
            .collect()
    }

    /// Log-likelihood contribution of each group, in group order.
    pub fn group_log_likelihoods(&self, beta: &[f64]) -> Result<Vec<f64>> {
        let log_probs = self.group_log_probs(beta)?;
        Ok(self
            .data
            .groups()
            .iter()
            .zip(log_probs)
            .map(|(g, lp)| lp[g.chosen])
            .collect())
    }

    /// Choice probability of every row within its group.
    pub fn probabilities(&self, beta: &[f64]) -> Result<Vec<f64>> {
        let log_probs = self.group_log_probs(beta)?;
        let mut out = vec![0.0; self.data.n_rows()];
        for (g, lp) in self.data.groups().iter().zip(log_probs) {
            for (&row, l) in g.rows.iter().zip(lp) {
                out[row] = l.exp();
            }
        }
        Ok(out)
    }

    /// Probability-weighted mean design row of each group.
    fn weighted_means(&self, probs: &[f64]) -> Vec<Array1<f64>> {
        let x = self.data.x();
        self.data
            .groups()
            .iter()
            .map(|g| {
                let mut mean = Array1::zeros(x.ncols());
                for &r in &g.rows {
                    mean.scaled_add(probs[r], &x.row(r));
                }
                mean
            })
            .collect()
    }
}

impl LogLikelihood for MultinomialLogit {
    fn dim(&self) -> usize {
        self.data.n_features()
    }

    fn parameter_names(&self) -> Vec<String> {
        self.data.feature_names().to_vec()
    }

    fn log_likelihood(&self, beta: &[f64]) -> Result<f64> {
        let total: f64 = self.group_log_likelihoods(beta)?.iter().sum();
        ensure_finite(total, "multinomial logit log-likelihood")
    }

    fn gradient(&self, beta: &[f64]) -> Result<Vec<f64>> {
        let probs = self.probabilities(beta)?;
        let x = self.data.x();
        let mut grad = Array1::<f64>::zeros(x.ncols());
        for (g, mean) in self.data.groups().iter().zip(self.weighted_means(&probs)) {
            grad += &x.row(g.chosen_row());
            grad -= &mean;
        }
        grad.iter()
            .map(|&v| ensure_finite(v, "multinomial logit gradient"))
            .collect()
    }

    fn hessian(&self, beta: &[f64]) -> Result<Array2<f64>> {
        let probs = self.probabilities(beta)?;
        let x = self.data.x();
        let p = x.ncols();
        let mut hess = Array2::<f64>::zeros((p, p));
        for (g, mean) in self.data.groups().iter().zip(self.weighted_means(&probs)) {
            for &r in &g.rows {
                let dev = &x.row(r) - &mean;
                for a in 0..p {
                    for b in 0..p {
                        hess[[a, b]] -= probs[r] * dev[a] * dev[b];
                    }
                }
            }
        }
        for &v in hess.iter() {
            ensure_finite(v, "multinomial logit hessian")?;
        }
        Ok(hess)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use ndarray::array;

    fn three_alternatives(chosen: usize) -> MultinomialLogit {
        // Identity design: utility of alternative j is beta[j].
        let x = array![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let mut flags = vec![false; 3];
        flags[chosen] = true;
        MultinomialLogit::new(ChoiceData::new(x, flags, vec![0, 0, 0]).unwrap())
    }

    #[test]
    fn single_group_matches_direct_formula() {
        let model = three_alternatives(1);
        let ll = model.log_likelihood(&[2.0, 1.0, 0.0]).unwrap();
        let direct = 1.0 - (2f64.exp() + 1f64.exp() + 1.0).ln();
        assert!((ll - direct).abs() < 1e-9);
    }

    #[test]
    fn probabilities_sum_to_one_per_group() {
        let model = three_alternatives(0);
        let p = model.probabilities(&[0.3, -1.2, 4.0]).unwrap();
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn large_utilities_stay_finite() {
        let model = three_alternatives(2);
        let ll = model.log_likelihood(&[900.0, 800.0, 0.0]).unwrap();
        assert!((ll + 900.0).abs() < 1e-9);
    }

    #[test]
    fn gradient_matches_finite_differences() {
        let x = array![
            [1.0, 2.0],
            [0.0, 1.0],
            [0.0, 3.0],
            [1.0, 1.5],
            [0.0, 2.5]
        ];
        let data = ChoiceData::new(x, vec![false, true, false, true, false], vec![0, 0, 0, 1, 1])
            .unwrap();
        let model = MultinomialLogit::new(data);
        let beta = [0.4, -0.7];

        let analytic = model.gradient(&beta).unwrap();
        let h = 1e-6;
        for j in 0..2 {
            let mut up = beta;
            let mut down = beta;
            up[j] += h;
            down[j] -= h;
            let numeric = (model.log_likelihood(&up).unwrap() - model.log_likelihood(&down).unwrap())
                / (2.0 * h);
            assert!((analytic[j] - numeric).abs() < 1e-6, "coordinate {j}");
        }
    }

    #[test]
    fn hessian_matches_default_finite_differences() {
        let x = array![[1.0, 2.0], [0.0, 1.0], [0.0, 3.0]];
        let data = ChoiceData::new(x, vec![true, false, false], vec![5, 5, 5]).unwrap();
        let model = MultinomialLogit::new(data);
        let beta = [0.2, 0.1];

        let analytic = model.hessian(&beta).unwrap();
        let wrapped = crate::model::FnLogLikelihood::new(2, |b: &[f64]| model.log_likelihood(b));
        let numeric = wrapped.hessian(&beta).unwrap();
        for (a, n) in analytic.iter().zip(numeric.iter()) {
            assert!((a - n).abs() < 1e-4, "{a} vs {n}");
        }
        assert!(analytic[[0, 0]] <= 0.0 && analytic[[1, 1]] <= 0.0);
    }

    #[test]
    fn wrong_beta_length() {
        let model = three_alternatives(0);
        assert!(matches!(
            model.log_likelihood(&[1.0]),
            Err(Error::DimensionMismatch { expected: 3, found: 1 })
        ));
    }
}
