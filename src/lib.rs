//! # iterfit
//!
//! Iterative estimation primitives: Lloyd k-means with a replayable trace,
//! the multinomial logit log-likelihood for conjoint choice data, maximum
//! likelihood with Hessian standard errors, and random-walk
//! Metropolis-Hastings.
//!
//! Every estimator takes explicit parameters and, where randomness is
//! involved, either a seed or a caller-supplied `rand::Rng`.
//!
//! **Default build** includes clustering and MCMC. The choice model and the
//! MLE driver are always available.

/// Error types used across `iterfit`.
pub mod error;
pub mod linalg;
pub mod model;

pub mod choice;
pub mod mle;
pub mod poisson;

#[cfg(feature = "cluster")]
pub mod cluster;
#[cfg(feature = "cluster")]
pub mod metrics;
#[cfg(feature = "mcmc")]
pub mod mcmc;


pub use error::{Error, ErrorKind, Result};
pub use model::{FnLogLikelihood, LogLikelihood};

pub use choice::{ChoiceData, MultinomialLogit};
pub use mle::{MaximumLikelihood, MleFit};
pub use poisson::PoissonRegression;

#[cfg(feature = "cluster")]
pub use cluster::{Clustering, Kmeans, KmeansFit, KmeansTrace};
#[cfg(feature = "cluster")]
pub use metrics::{ari, elbow, silhouette, wcss};

#[cfg(feature = "mcmc")]
pub use mcmc::{Chain, MetropolisHastings, NormalPrior, Prior};
