//! Simulating choices from a known β.
//!
//! Adding i.i.d. standard Gumbel noise to linear utilities and taking the
//! argmax per task reproduces multinomial logit choice probabilities exactly,
//! which makes this the natural way to build synthetic conjoint data with a
//! known ground truth.

use super::data::{group_rows, ChoiceData};
use crate::error::{Error, Result};
use crate::linalg::{ensure_finite, mat_vec};
use ndarray::Array2;
use rand::Rng;
use rand_distr::{Distribution, Gumbel};

/// Draw one choice per task from the logit model with parameters `beta`.
pub fn simulate_choices<R: Rng + ?Sized>(
    x: Array2<f64>,
    group_ids: Vec<usize>,
    beta: &[f64],
    rng: &mut R,
) -> Result<ChoiceData> {
    if group_ids.len() != x.nrows() {
        return Err(Error::DimensionMismatch {
            expected: x.nrows(),
            found: group_ids.len(),
        });
    }
    let utilities = mat_vec(x.view(), beta)?;
    for &u in utilities.iter() {
        ensure_finite(u, "simulated utilities")?;
    }
    let noise = Gumbel::new(0.0, 1.0).map_err(|e| Error::InvalidInput(e.to_string()))?;

    let mut chosen = vec![false; x.nrows()];
    for (_, rows) in group_rows(&group_ids) {
        let mut best_row = rows[0];
        let mut best = f64::NEG_INFINITY;
        for &r in &rows {
            let draw = utilities[r] + noise.sample(rng);
            if draw > best {
                best = draw;
                best_row = r;
            }
        }
        chosen[best_row] = true;
    }

    ChoiceData::new(x, chosen, group_ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::choice::MultinomialLogit;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn every_task_gets_exactly_one_choice() {
        let mut rng = StdRng::seed_from_u64(11);
        let x = Array2::from_shape_fn((12, 2), |(i, j)| (i * 3 + j) as f64 * 0.1);
        let ids: Vec<usize> = (0..12).map(|i| i / 3).collect();
        let data = simulate_choices(x, ids, &[0.5, -0.5], &mut rng).unwrap();
        assert_eq!(data.n_groups(), 4);
        assert_eq!(data.chosen().iter().filter(|&&c| c).count(), 4);
    }

    #[test]
    fn choice_shares_match_logit_probabilities() {
        // One repeated task with utilities [1, 0, -1].
        let tasks = 4000;
        let mut rng = StdRng::seed_from_u64(2024);
        let x = Array2::from_shape_fn((3 * tasks, 1), |(i, _)| 1.0 - (i % 3) as f64);
        let ids: Vec<usize> = (0..3 * tasks).map(|i| i / 3).collect();
        let data = simulate_choices(x, ids, &[1.0], &mut rng).unwrap();

        let picked_first = data
            .groups()
            .iter()
            .filter(|g| g.chosen == 0)
            .count() as f64
            / tasks as f64;

        let model = MultinomialLogit::new(data);
        let p = model.probabilities(&[1.0]).unwrap();
        // Standard error of the share is about 0.008 here.
        assert!((picked_first - p[0]).abs() < 0.04, "{picked_first} vs {}", p[0]);
    }

    #[test]
    fn non_finite_beta_is_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        let x = Array2::from_shape_fn((20, 1), |(i, _)| i as f64);
        let ids: Vec<usize> = (0..20).map(|i| i / 2).collect();
        let err = simulate_choices(x, ids, &[f64::NAN], &mut rng).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NumericInstability);
    }

    #[test]
    fn misaligned_group_ids() {
        let mut rng = StdRng::seed_from_u64(0);
        let x = Array2::zeros((4, 1));
        assert!(simulate_choices(x, vec![0, 0, 1], &[1.0], &mut rng).is_err());
    }
}
