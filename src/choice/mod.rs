//! Discrete choice: data, the multinomial logit likelihood, and simulation.
//!
//! A conjoint-style data set is a stack of alternatives. Each row is one
//! product profile (brand dummies, price, ...), rows sharing a group id were
//! shown together, and exactly one row per group was picked.
//!
//! ```rust
//! use iterfit::choice::{ChoiceData, MultinomialLogit};
//! use iterfit::LogLikelihood;
//!
//! // Columns: [is_brand_a, price]
//! let data = ChoiceData::from_rows(
//!     &[vec![1.0, 2.0], vec![0.0, 1.0], vec![0.0, 3.0]],
//!     vec![true, false, false],
//!     vec![0, 0, 0],
//! )
//! .unwrap();
//!
//! let model = MultinomialLogit::new(data);
//! let ll = model.log_likelihood(&[1.0, -0.1]).unwrap();
//! assert!(ll < 0.0);
//! ```

mod data;
mod mnl;
mod simulate;

pub use data::{decode_one_hot, one_hot, ChoiceData, ChoiceGroup};
pub use mnl::MultinomialLogit;
pub use simulate::simulate_choices;
