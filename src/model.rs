//! The likelihood seam shared by the optimizer and the sampler.
//!
//! [`MaximumLikelihood`](crate::mle::MaximumLikelihood) minimizes the negated
//! log-likelihood; the Metropolis-Hastings sampler adds a log-prior to it.
//! Both only ever see a [`LogLikelihood`].

use crate::error::{Error, Result};
use crate::linalg::ensure_finite;
use ndarray::Array2;

/// A log-likelihood over a fixed-length real parameter vector.
pub trait LogLikelihood {
    /// Number of parameters.
    fn dim(&self) -> usize;

    /// Display names, one per parameter.
    fn parameter_names(&self) -> Vec<String> {
        (1..=self.dim()).map(|j| format!("beta{j}")).collect()
    }

    /// `log L(β)`.
    fn log_likelihood(&self, beta: &[f64]) -> Result<f64>;

    /// `∇ log L(β)`. Defaults to central finite differences.
    fn gradient(&self, beta: &[f64]) -> Result<Vec<f64>> {
        check_params(self.dim(), beta)?;
        let mut probe = beta.to_vec();
        let mut grad = vec![0.0; beta.len()];
        for j in 0..beta.len() {
            let h = fd_step(beta[j]);
            probe[j] = beta[j] + h;
            let up = self.log_likelihood(&probe)?;
            probe[j] = beta[j] - h;
            let down = self.log_likelihood(&probe)?;
            probe[j] = beta[j];
            grad[j] = ensure_finite((up - down) / (2.0 * h), "finite-difference gradient")?;
        }
        Ok(grad)
    }

    /// `∇² log L(β)`. Defaults to central differences of [`gradient`](Self::gradient),
    /// symmetrized.
    fn hessian(&self, beta: &[f64]) -> Result<Array2<f64>> {
        check_params(self.dim(), beta)?;
        let p = beta.len();
        let mut probe = beta.to_vec();
        let mut hess = Array2::zeros((p, p));
        for j in 0..p {
            let h = fd_step(beta[j]);
            probe[j] = beta[j] + h;
            let up = self.gradient(&probe)?;
            probe[j] = beta[j] - h;
            let down = self.gradient(&probe)?;
            probe[j] = beta[j];
            for i in 0..p {
                hess[[i, j]] = (up[i] - down[i]) / (2.0 * h);
            }
        }
        let sym = (&hess + &hess.t()) * 0.5;
        if sym.iter().any(|v| !v.is_finite()) {
            return Err(Error::NumericInstability {
                context: "finite-difference hessian",
            });
        }
        Ok(sym)
    }
}

impl<M: LogLikelihood + ?Sized> LogLikelihood for &M {
    fn dim(&self) -> usize {
        (**self).dim()
    }

    fn parameter_names(&self) -> Vec<String> {
        (**self).parameter_names()
    }

    fn log_likelihood(&self, beta: &[f64]) -> Result<f64> {
        (**self).log_likelihood(beta)
    }

    fn gradient(&self, beta: &[f64]) -> Result<Vec<f64>> {
        (**self).gradient(beta)
    }

    fn hessian(&self, beta: &[f64]) -> Result<Array2<f64>> {
        (**self).hessian(beta)
    }
}

#[inline]
fn fd_step(x: f64) -> f64 {
    1e-5 * x.abs().max(1.0)
}

/// Reject parameter vectors of the wrong length.
pub(crate) fn check_params(dim: usize, beta: &[f64]) -> Result<()> {
    if beta.len() != dim {
        return Err(Error::DimensionMismatch {
            expected: dim,
            found: beta.len(),
        });
    }
    Ok(())
}

/// A log-likelihood given by a closure.
///
/// ```rust
/// use iterfit::{FnLogLikelihood, LogLikelihood};
///
/// // Gaussian location model with known unit variance, 4 observations at mean 3.
/// let model = FnLogLikelihood::new(1, |b: &[f64]| Ok(-2.0 * (b[0] - 3.0).powi(2)));
/// assert!(model.log_likelihood(&[3.0]).unwrap() > model.log_likelihood(&[2.0]).unwrap());
/// ```
pub struct FnLogLikelihood<F> {
    dim: usize,
    f: F,
    names: Option<Vec<String>>,
}

impl<F> FnLogLikelihood<F>
where
    F: Fn(&[f64]) -> Result<f64>,
{
    /// Wrap `f` as a `dim`-parameter log-likelihood.
    pub fn new(dim: usize, f: F) -> Self {
        Self { dim, f, names: None }
    }

    /// Attach parameter names.
    pub fn with_names(mut self, names: Vec<String>) -> Self {
        self.names = Some(names);
        self
    }
}

impl<F> LogLikelihood for FnLogLikelihood<F>
where
    F: Fn(&[f64]) -> Result<f64>,
{
    fn dim(&self) -> usize {
        self.dim
    }

    fn parameter_names(&self) -> Vec<String> {
        match &self.names {
            Some(names) => names.clone(),
            None => (1..=self.dim).map(|j| format!("beta{j}")).collect(),
        }
    }

    fn log_likelihood(&self, beta: &[f64]) -> Result<f64> {
        check_params(self.dim, beta)?;
        (self.f)(beta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quadratic() -> FnLogLikelihood<impl Fn(&[f64]) -> Result<f64>> {
        // log L = -(b0 - 1)^2 - 2 (b1 + 2)^2 + b0 b1
        FnLogLikelihood::new(2, |b: &[f64]| {
            Ok(-(b[0] - 1.0).powi(2) - 2.0 * (b[1] + 2.0).powi(2) + b[0] * b[1])
        })
    }

    #[test]
    fn finite_difference_gradient() {
        let m = quadratic();
        let g = m.gradient(&[0.5, -1.0]).unwrap();
        // d/db0 = -2(b0-1) + b1 = 1 - 1 = 0 ; d/db1 = -4(b1+2) + b0 = -4 + 0.5
        assert!(g[0].abs() < 1e-6);
        assert!((g[1] + 3.5).abs() < 1e-6);
    }

    #[test]
    fn finite_difference_hessian_is_symmetric() {
        let h = quadratic().hessian(&[0.0, 0.0]).unwrap();
        assert!((h[[0, 0]] + 2.0).abs() < 1e-4);
        assert!((h[[1, 1]] + 4.0).abs() < 1e-4);
        assert!((h[[0, 1]] - 1.0).abs() < 1e-4);
        assert_eq!(h[[0, 1]], h[[1, 0]]);
    }

    #[test]
    fn wrong_length_is_rejected() {
        let m = quadratic();
        assert!(matches!(
            m.log_likelihood(&[1.0]),
            Err(Error::DimensionMismatch { expected: 2, found: 1 })
        ));
    }

    #[test]
    fn default_names() {
        assert_eq!(quadratic().parameter_names(), vec!["beta1", "beta2"]);
    }
}
