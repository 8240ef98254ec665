//! Random-walk Metropolis-Hastings.
//!
//! ```text
//! β' = β + sd ⊙ z,   z ~ N(0, I)
//! accept  iff  ln u < log π(β') - log π(β),   u ~ U(0, 1)
//! ```
//!
//! with `log π = log L + log p`. The proposal is symmetric, so no Hastings
//! correction appears. The chain records the state after every step, so a
//! run of `steps` iterations always yields `steps` rows.

use super::chain::Chain;
use super::prior::Prior;
use crate::error::{Error, Result};
use crate::model::{check_params, LogLikelihood};
use ndarray::Array2;
use rand::prelude::*;
use rand_distr::{Distribution, StandardNormal};
use tracing::{debug, trace};

/// Random-walk Metropolis-Hastings configuration.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetropolisHastings {
    /// Number of steps to record.
    steps: usize,
    /// Per-coordinate proposal standard deviation.
    proposal_sd: Vec<f64>,
    /// Random seed.
    seed: Option<u64>,
}

impl MetropolisHastings {
    /// Sampler running `steps` iterations with per-coordinate proposal sds.
    pub fn new(steps: usize, proposal_sd: Vec<f64>) -> Self {
        Self {
            steps,
            proposal_sd,
            seed: None,
        }
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of steps.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Proposal standard deviations.
    pub fn proposal_sd(&self) -> &[f64] {
        &self.proposal_sd
    }

    fn validate(&self, init: &[f64]) -> Result<()> {
        if self.steps == 0 {
            return Err(Error::InvalidParameter {
                name: "steps",
                message: "must be > 0",
            });
        }
        if self.proposal_sd.len() != init.len() {
            return Err(Error::DimensionMismatch {
                expected: init.len(),
                found: self.proposal_sd.len(),
            });
        }
        if self.proposal_sd.iter().any(|s| !(s.is_finite() && *s >= 0.0)) {
            return Err(Error::InvalidParameter {
                name: "proposal_sd",
                message: "must be finite and >= 0",
            });
        }
        Ok(())
    }

    /// Run one chain from `init` using the configured seed.
    pub fn run<M, P>(&self, model: &M, prior: &P, init: &[f64]) -> Result<Chain>
    where
        M: LogLikelihood + ?Sized,
        P: Prior + ?Sized,
    {
        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };
        self.run_with_rng(model, prior, init, &mut rng)
    }

    /// Run one chain from `init`, drawing proposals and uniforms from `rng`.
    pub fn run_with_rng<M, P, R>(&self, model: &M, prior: &P, init: &[f64], rng: &mut R) -> Result<Chain>
    where
        M: LogLikelihood + ?Sized,
        P: Prior + ?Sized,
        R: Rng + ?Sized,
    {
        check_params(model.dim(), init)?;
        self.validate(init)?;

        let log_posterior = |beta: &[f64]| -> Result<f64> {
            Ok(model.log_likelihood(beta)? + prior.log_density(beta)?)
        };

        let dim = init.len();
        let mut current = init.to_vec();
        let mut current_lp = log_posterior(&current)?;
        if !current_lp.is_finite() {
            return Err(Error::NumericInstability {
                context: "initial log posterior",
            });
        }

        let mut samples = Array2::<f64>::zeros((self.steps, dim));
        let mut accepted = Vec::with_capacity(self.steps);
        let mut proposal = vec![0.0; dim];

        for step in 0..self.steps {
            for ((p, &c), &sd) in proposal.iter_mut().zip(&current).zip(&self.proposal_sd) {
                let z: f64 = StandardNormal.sample(rng);
                *p = c + sd * z;
            }
            let proposal_lp = log_posterior(&proposal)?;
            // -inf is an ordinary rejection; NaN and +inf are not.
            if !proposal_lp.is_finite() && proposal_lp != f64::NEG_INFINITY {
                return Err(Error::NumericInstability {
                    context: "proposal log posterior",
                });
            }

            let u: f64 = rng.random();
            let accept = u.ln() < proposal_lp - current_lp;
            if accept {
                current.copy_from_slice(&proposal);
                current_lp = proposal_lp;
            }
            trace!(step, accept, log_posterior = current_lp, "mh step");

            samples.row_mut(step).assign(&ndarray::ArrayView1::from(&current[..]));
            accepted.push(accept);
        }

        let chain = Chain::new(samples, accepted, model.parameter_names());
        debug!(
            steps = self.steps,
            acceptance_rate = chain.acceptance_rate(),
            "metropolis-hastings finished"
        );
        Ok(chain)
    }
}
