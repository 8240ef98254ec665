//! Priors over the parameter vector.

use crate::error::{Error, Result};
use crate::model::check_params;

const LN_SQRT_2PI: f64 = 0.918_938_533_204_672_8;

/// Log prior density, up to an additive constant.
pub trait Prior {
    /// `log p(β)`. May be `-inf` outside the support.
    fn log_density(&self, beta: &[f64]) -> Result<f64>;
}

impl<P: Prior + ?Sized> Prior for &P {
    fn log_density(&self, beta: &[f64]) -> Result<f64> {
        (**self).log_density(beta)
    }
}

/// Improper uniform prior: the posterior is the likelihood.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlatPrior;

impl Prior for FlatPrior {
    fn log_density(&self, _beta: &[f64]) -> Result<f64> {
        Ok(0.0)
    }
}

/// Independent normal prior per coordinate.
///
/// Conjoint models typically use a wide prior on brand dummies and a tighter
/// one on price:
///
/// ```rust
/// use iterfit::mcmc::{NormalPrior, Prior};
///
/// let prior = NormalPrior::new(vec![0.0, 0.0], vec![5.0, 1.0]).unwrap();
/// assert!(prior.log_density(&[0.0, 0.0]).unwrap() > prior.log_density(&[0.0, 3.0]).unwrap());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NormalPrior {
    means: Vec<f64>,
    sds: Vec<f64>,
}

impl NormalPrior {
    /// Prior with the given per-coordinate means and standard deviations.
    pub fn new(means: Vec<f64>, sds: Vec<f64>) -> Result<Self> {
        if means.len() != sds.len() {
            return Err(Error::DimensionMismatch {
                expected: means.len(),
                found: sds.len(),
            });
        }
        if means.is_empty() {
            return Err(Error::EmptyInput);
        }
        if sds.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
            return Err(Error::InvalidParameter {
                name: "sds",
                message: "must be finite and > 0",
            });
        }
        if means.iter().any(|m| !m.is_finite()) {
            return Err(Error::InvalidParameter {
                name: "means",
                message: "must be finite",
            });
        }
        Ok(Self { means, sds })
    }

    /// `N(0, sd²)` on each of `dim` coordinates.
    pub fn isotropic(dim: usize, sd: f64) -> Result<Self> {
        Self::new(vec![0.0; dim], vec![sd; dim])
    }

    /// Prior means.
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// Prior standard deviations.
    pub fn sds(&self) -> &[f64] {
        &self.sds
    }
}

impl Prior for NormalPrior {
    fn log_density(&self, beta: &[f64]) -> Result<f64> {
        check_params(self.means.len(), beta)?;
        Ok(beta
            .iter()
            .zip(&self.means)
            .zip(&self.sds)
            .map(|((b, m), s)| {
                let z = (b - m) / s;
                -0.5 * z * z - s.ln() - LN_SQRT_2PI
            })
            .sum())
    }
}
