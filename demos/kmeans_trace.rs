use iterfit::{elbow, silhouette, Kmeans};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=iterfit=debug shows every Lloyd step.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Three loose blobs in 2D.
    let centers = [(0.0, 0.0), (6.0, 1.0), (3.0, 7.0)];
    let mut data = Vec::new();
    for (i, &(cx, cy)) in centers.iter().enumerate() {
        for j in 0..20 {
            let t = (i * 20 + j) as f64;
            data.push(vec![cx + (t * 0.37).sin(), cy + (t * 0.91).cos()]);
        }
    }

    let trace = Kmeans::new(3).with_seed(7).trace(&data)?;
    for step in &trace {
        println!(
            "iter {:>2}  shift {:>8.4}  wcss {:>9.3}  empty {:?}",
            step.iteration, step.shift, step.wcss, step.empty_clusters
        );
    }

    let fit = trace.fit()?;
    println!("converged={} after {} iterations", fit.converged, fit.iterations);
    for (k, row) in fit.centroids.rows().into_iter().enumerate() {
        println!("  centroid {k}: ({:.3}, {:.3})", row[0], row[1]);
    }
    println!("silhouette={:.3}", silhouette(&data, &fit.labels)?);

    println!("elbow:");
    for (k, w) in elbow(&data, &[1, 2, 3, 4, 5], 7)? {
        println!("  k={k} wcss={w:.3}");
    }

    Ok(())
}
