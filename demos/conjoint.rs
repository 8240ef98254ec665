use iterfit::choice::{simulate_choices, MultinomialLogit};
use iterfit::mcmc::{MetropolisHastings, NormalPrior};
use iterfit::MaximumLikelihood;
use ndarray::Array2;
use rand::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 300 tasks of 3 products: [is_brand_a, is_brand_b, price].
    let truth = [0.8, 0.3, -1.2];
    let tasks = 300;
    let mut rng = StdRng::seed_from_u64(2024);
    let x = Array2::from_shape_fn((tasks * 3, 3), |(row, col)| match col {
        0 => f64::from(u8::from(row % 3 == 0)),
        1 => f64::from(u8::from(row % 3 == 1)),
        _ => rng.random_range(1.0..3.0),
    });
    let ids = (0..tasks * 3).map(|row| row / 3).collect();
    let data = simulate_choices(x, ids, &truth, &mut rng)?
        .with_feature_names(vec!["is_brand_a", "is_brand_b", "price"])?;
    let model = MultinomialLogit::new(data);

    let fit = MaximumLikelihood::new().fit(&model, &[0.0; 3])?;
    println!(
        "MLE  log L = {:.3}  ({} iterations, converged={})",
        fit.log_likelihood, fit.iterations, fit.converged
    );
    let ci = fit.confidence_intervals(1.96);
    for (j, name) in fit.names.iter().enumerate() {
        println!(
            "  {name:<11} {:>7.3}  se {:.3}  z {:>6.2}  95% [{:.3}, {:.3}]  (true {:.1})",
            fit.beta[j],
            fit.std_errors[j],
            fit.z_scores()[j],
            ci[j].0,
            ci[j].1,
            truth[j]
        );
    }

    // Wide priors on brand dummies, tighter on price.
    let prior = NormalPrior::new(vec![0.0; 3], vec![5.0, 5.0, 1.0])?;
    let sd: Vec<f64> = fit.std_errors.iter().map(|se| 1.4 * se).collect();
    let chain = MetropolisHastings::new(10_000, sd)
        .with_seed(1)
        .run(&model, &prior, &fit.beta)?
        .burn_in(2_000)?;
    println!("MCMC acceptance rate {:.2}", chain.acceptance_rate());
    for s in chain.summarize(0.95)? {
        println!(
            "  {:<11} mean {:>7.3}  sd {:.3}  95% [{:.3}, {:.3}]",
            s.name, s.mean, s.sd, s.lower, s.upper
        );
    }

    Ok(())
}
