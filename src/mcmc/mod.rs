//! Bayesian estimation by random-walk Metropolis-Hastings.
//!
//! The sampler targets `log L(β) + log p(β)` for any
//! [`LogLikelihood`](crate::LogLikelihood) and [`Prior`], and returns a
//! [`Chain`] of every visited state.
//!
//! ```rust
//! use iterfit::mcmc::{FlatPrior, MetropolisHastings};
//! use iterfit::FnLogLikelihood;
//!
//! let model = FnLogLikelihood::new(1, |b: &[f64]| Ok(-0.5 * (b[0] - 2.0).powi(2)));
//! let chain = MetropolisHastings::new(5_000, vec![1.0])
//!     .with_seed(42)
//!     .run(&model, &FlatPrior, &[0.0])
//!     .unwrap()
//!     .burn_in(500)
//!     .unwrap();
//!
//! let summary = chain.summarize(0.95).unwrap();
//! assert!((summary[0].mean - 2.0).abs() < 0.2);
//! ```

mod chain;
mod prior;
mod sampler;

pub use chain::{Chain, ParameterSummary};
pub use prior::{FlatPrior, NormalPrior, Prior};
pub use sampler::MetropolisHastings;
