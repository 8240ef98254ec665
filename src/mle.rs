//! Maximum likelihood estimation with Hessian-based standard errors.
//!
//! The optimizer is `argmin`'s L-BFGS with a More-Thuente line search. This
//! module only supplies the objective: the negated log-likelihood and its
//! gradient, taken from any [`LogLikelihood`].
//!
//! # Standard errors
//!
//! At the optimum β̂ the observed information is `I = -∇² log L(β̂)` and the
//! asymptotic covariance is `I⁻¹`. `I` must be symmetric positive definite and
//! reasonably conditioned; otherwise the fit fails with
//! [`Error::IllConditioned`] instead of reporting NaN or absurd standard errors.
//! The usual cause is a design column that never varies within a choice task
//! (a constant, or an attribute collinear with others).

use crate::error::{Error, Result};
use crate::model::{check_params, LogLikelihood};
use argmin::core::{CostFunction, Executor, Gradient, State, TerminationReason};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::quasinewton::LBFGS;
use faer::prelude::*;
use faer::{Mat, Side};
use ndarray::Array2;
use tracing::{debug, warn};

/// L-BFGS over plain `Vec<f64>` parameters.
type Lbfgs = LBFGS<MoreThuenteLineSearch<Vec<f64>, Vec<f64>, f64>, Vec<f64>, Vec<f64>, f64>;

/// Smallest accepted ratio of extreme eigenvalues of the information matrix.
const MIN_RCOND: f64 = 1e-12;

/// Maximum likelihood driver.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MaximumLikelihood {
    max_iters: u64,
    grad_tol: f64,
    cost_tol: f64,
    memory: usize,
}

/// Result of a maximum likelihood fit.
#[derive(Debug, Clone)]
pub struct MleFit {
    /// Parameter names, in order.
    pub names: Vec<String>,
    /// Estimates β̂.
    pub beta: Vec<f64>,
    /// `log L(β̂)`.
    pub log_likelihood: f64,
    /// Inverse observed information.
    pub covariance: Array2<f64>,
    /// Square roots of the covariance diagonal.
    pub std_errors: Vec<f64>,
    /// Optimizer iterations.
    pub iterations: u64,
    /// Whether the optimizer met a tolerance (as opposed to the iteration cap).
    pub converged: bool,
}

impl MleFit {
    /// `β̂ⱼ / se(β̂ⱼ)`.
    pub fn z_scores(&self) -> Vec<f64> {
        self.beta
            .iter()
            .zip(&self.std_errors)
            .map(|(b, se)| b / se)
            .collect()
    }

    /// Wald intervals `β̂ ± z·se`; `z = 1.96` gives 95%.
    pub fn confidence_intervals(&self, z: f64) -> Vec<(f64, f64)> {
        self.beta
            .iter()
            .zip(&self.std_errors)
            .map(|(b, se)| (b - z * se, b + z * se))
            .collect()
    }
}

impl Default for MaximumLikelihood {
    fn default() -> Self {
        Self::new()
    }
}

impl MaximumLikelihood {
    /// Defaults: 200 iterations, gradient tolerance 1e-8, L-BFGS memory 7.
    pub fn new() -> Self {
        Self {
            max_iters: 200,
            grad_tol: 1e-8,
            cost_tol: 1e-12,
            memory: 7,
        }
    }

    /// Set the iteration cap.
    pub fn with_max_iters(mut self, max_iters: u64) -> Self {
        self.max_iters = max_iters;
        self
    }

    /// Set the gradient-norm tolerance.
    pub fn with_grad_tol(mut self, tol: f64) -> Self {
        self.grad_tol = tol;
        self
    }

    /// Set the tolerance on the change in cost between iterations.
    pub fn with_cost_tol(mut self, tol: f64) -> Self {
        self.cost_tol = tol;
        self
    }

    /// Set the L-BFGS history size.
    pub fn with_memory(mut self, memory: usize) -> Self {
        self.memory = memory;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.max_iters == 0 {
            return Err(Error::InvalidParameter {
                name: "max_iters",
                message: "must be > 0",
            });
        }
        if self.memory == 0 {
            return Err(Error::InvalidParameter {
                name: "memory",
                message: "must be > 0",
            });
        }
        if !(self.grad_tol.is_finite() && self.grad_tol >= 0.0)
            || !(self.cost_tol.is_finite() && self.cost_tol >= 0.0)
        {
            return Err(Error::InvalidParameter {
                name: "tolerance",
                message: "must be finite and >= 0",
            });
        }
        Ok(())
    }

    /// Maximize `model`'s log-likelihood starting from `init`.
    pub fn fit<M: LogLikelihood + ?Sized>(&self, model: &M, init: &[f64]) -> Result<MleFit> {
        self.validate()?;
        check_params(model.dim(), init)?;
        if init.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidInput("initial parameters must be finite".to_string()));
        }

        let solver: Lbfgs = LBFGS::new(MoreThuenteLineSearch::new(), self.memory)
            .with_tolerance_grad(self.grad_tol)
            .map_err(from_argmin)?
            .with_tolerance_cost(self.cost_tol)
            .map_err(from_argmin)?;

        let result = Executor::new(NegLogLikelihood { model }, solver)
            .configure(|state| state.param(init.to_vec()).max_iters(self.max_iters))
            .run()
            .map_err(from_argmin)?;

        let state = result.state();
        let beta = state
            .get_best_param()
            .cloned()
            .ok_or_else(|| Error::Optimizer("no parameters were evaluated".to_string()))?;
        let iterations = state.get_iter();
        let converged = !matches!(
            state.get_termination_reason(),
            Some(TerminationReason::MaxItersReached) | None
        );
        if !converged {
            warn!(iterations, "optimizer stopped without converging");
        }

        let log_likelihood = model.log_likelihood(&beta)?;
        let covariance = covariance(model, &beta)?;
        let std_errors = covariance.diag().iter().map(|v| v.sqrt()).collect();
        debug!(iterations, converged, log_likelihood, "mle finished");

        Ok(MleFit {
            names: model.parameter_names(),
            beta,
            log_likelihood,
            covariance,
            std_errors,
            iterations,
            converged,
        })
    }
}

/// Inverse observed information at `beta`.
pub fn covariance<M: LogLikelihood + ?Sized>(model: &M, beta: &[f64]) -> Result<Array2<f64>> {
    let information = -model.hessian(beta)?;
    invert_information(&information)
}

/// Standard errors at `beta`: square roots of the covariance diagonal.
pub fn standard_errors<M: LogLikelihood + ?Sized>(model: &M, beta: &[f64]) -> Result<Vec<f64>> {
    Ok(covariance(model, beta)?.diag().iter().map(|v| v.sqrt()).collect())
}

fn invert_information(information: &Array2<f64>) -> Result<Array2<f64>> {
    let p = information.nrows();
    if p == 0 || information.ncols() != p {
        return Err(Error::ShapeMismatch {
            expected: "non-empty square matrix".to_string(),
            actual: format!("{}x{}", information.nrows(), information.ncols()),
        });
    }
    if information.iter().any(|v| !v.is_finite()) {
        return Err(Error::IllConditioned(
            "information matrix has non-finite entries".to_string(),
        ));
    }

    let mat = Mat::<f64>::from_fn(p, p, |i, j| 0.5 * (information[[i, j]] + information[[j, i]]));

    let eigenvalues = mat.selfadjoint_eigenvalues(Side::Lower);
    let min = eigenvalues.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = eigenvalues.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if min.is_nan() || min <= 0.0 {
        return Err(Error::IllConditioned(format!(
            "information matrix is not positive definite (smallest eigenvalue {min:e})"
        )));
    }
    if min / max < MIN_RCOND {
        return Err(Error::IllConditioned(format!(
            "information matrix is near singular (eigenvalue ratio {:e})",
            min / max
        )));
    }

    let inverse = mat.full_piv_lu().solve(&Mat::<f64>::identity(p, p));
    let out = Array2::from_shape_fn((p, p), |(i, j)| inverse[(i, j)]);
    if out.iter().any(|v| !v.is_finite()) || out.diag().iter().any(|&v| v <= 0.0) {
        return Err(Error::IllConditioned(
            "inverse information has invalid variances".to_string(),
        ));
    }
    Ok(out)
}

/// Recover this crate's error if the optimizer surfaced one from the objective.
fn from_argmin(err: argmin::core::Error) -> Error {
    match err.downcast::<Error>() {
        Ok(inner) => inner,
        Err(other) => Error::Optimizer(other.to_string()),
    }
}

/// `-log L` and its gradient, the only things the optimizer sees.
struct NegLogLikelihood<'a, M: ?Sized> {
    model: &'a M,
}

impl<M: LogLikelihood + ?Sized> CostFunction for NegLogLikelihood<'_, M> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, beta: &Vec<f64>) -> std::result::Result<f64, argmin::core::Error> {
        Ok(-self.model.log_likelihood(beta)?)
    }
}

impl<M: LogLikelihood + ?Sized> Gradient for NegLogLikelihood<'_, M> {
    type Param = Vec<f64>;
    type Gradient = Vec<f64>;

    fn gradient(&self, beta: &Vec<f64>) -> std::result::Result<Vec<f64>, argmin::core::Error> {
        Ok(self.model.gradient(beta)?.into_iter().map(|g| -g).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::choice::{ChoiceData, MultinomialLogit};
    use crate::error::ErrorKind;
    use crate::model::FnLogLikelihood;
    use crate::poisson::PoissonRegression;

    /// Binary tasks: alternative A has x = 1, B has x = 0. A picked `n1` times.
    fn binary_tasks(n1: usize, n0: usize) -> MultinomialLogit {
        let mut rows = Vec::new();
        let mut chosen = Vec::new();
        let mut ids = Vec::new();
        for t in 0..(n1 + n0) {
            rows.push(vec![1.0]);
            rows.push(vec![0.0]);
            chosen.push(t < n1);
            chosen.push(t >= n1);
            ids.push(t);
            ids.push(t);
        }
        MultinomialLogit::new(ChoiceData::from_rows(&rows, chosen, ids).unwrap())
    }

    #[test]
    fn recovers_closed_form_logit_estimate() {
        // β̂ = ln(n1 / n0), se = sqrt(1/n1 + 1/n0)
        let model = binary_tasks(30, 10);
        let fit = MaximumLikelihood::new().fit(&model, &[0.0]).unwrap();

        assert!((fit.beta[0] - 3f64.ln()).abs() < 1e-5, "{:?}", fit.beta);
        let se = (1.0 / 30.0 + 1.0 / 10.0f64).sqrt();
        assert!((fit.std_errors[0] - se).abs() < 1e-4);
        assert!(fit.converged);
        assert_eq!(fit.names, vec!["x1"]);
    }

    #[test]
    fn gaussian_toy_has_unit_information() {
        // log L = -(b0 - 2)^2 / 2 - (b1 + 1)^2  → se = (1, 1/sqrt 2)
        let model = FnLogLikelihood::new(2, |b: &[f64]| {
            Ok(-0.5 * (b[0] - 2.0).powi(2) - (b[1] + 1.0).powi(2))
        });
        let fit = MaximumLikelihood::new().fit(&model, &[0.0, 0.0]).unwrap();
        assert!((fit.beta[0] - 2.0).abs() < 1e-5);
        assert!((fit.beta[1] + 1.0).abs() < 1e-5);
        assert!((fit.std_errors[0] - 1.0).abs() < 1e-3);
        assert!((fit.std_errors[1] - 0.5f64.sqrt()).abs() < 1e-3);

        let ci = fit.confidence_intervals(1.96);
        assert!(ci[0].0 < 2.0 && ci[0].1 > 2.0);
    }

    #[test]
    fn poisson_intercept_is_log_mean() {
        let x: Vec<Vec<f64>> = vec![vec![]; 4];
        let model = PoissonRegression::new(&x, vec![1, 2, 3, 6], true).unwrap();
        let fit = MaximumLikelihood::new().fit(&model, &[0.0]).unwrap();
        assert!((fit.beta[0] - 3f64.ln()).abs() < 1e-6);
        // se of the log-mean is 1 / sqrt(Σy)
        assert!((fit.std_errors[0] - (1.0 / 12f64).sqrt()).abs() < 1e-6);
    }

    #[test]
    fn constant_within_task_is_ill_conditioned() {
        // Second column is identical for both alternatives of every task.
        let rows = vec![
            vec![1.0, 5.0],
            vec![0.0, 5.0],
            vec![1.0, 2.0],
            vec![0.0, 2.0],
            vec![1.0, 3.0],
            vec![0.0, 3.0],
        ];
        let data = ChoiceData::from_rows(
            &rows,
            vec![true, false, false, true, true, false],
            vec![0, 0, 1, 1, 2, 2],
        )
        .unwrap();
        let model = MultinomialLogit::new(data);
        let err = covariance(&model, &[0.5, 0.0]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IllConditioned);
    }

    #[test]
    fn indefinite_information_is_rejected() {
        let model = FnLogLikelihood::new(1, |b: &[f64]| Ok(b[0] * b[0]));
        let err = standard_errors(&model, &[0.0]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IllConditioned);
    }

    #[test]
    fn objective_errors_keep_their_type() {
        let model = FnLogLikelihood::new(1, |_: &[f64]| {
            Err(Error::NumericInstability { context: "toy" })
        });
        let err = MaximumLikelihood::new().fit(&model, &[0.0]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NumericInstability);
    }

    #[test]
    fn rejects_bad_configuration() {
        let model = binary_tasks(2, 2);
        assert!(MaximumLikelihood::new().with_max_iters(0).fit(&model, &[0.0]).is_err());
        assert!(MaximumLikelihood::new().fit(&model, &[0.0, 1.0]).is_err());
    }
}
