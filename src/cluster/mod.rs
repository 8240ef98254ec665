//! Partitional clustering.
//!
//! ## K-means
//!
//! The classic algorithm: assign each point to the nearest centroid, then
//! update centroids to the mean of their points. Repeat.
//!
//! **Objective**: Minimize within-cluster sum of squares:
//!
//! ```text
//! J = Σ_k Σ_{x ∈ C_k} ||x - μ_k||²
//! ```
//!
//! **Assumptions**:
//! - Clusters are roughly spherical
//! - Clusters have similar sizes
//! - You know k in advance (or sweep it with [`crate::metrics::elbow`])
//!
//! ## Usage
//!
//! ```rust
//! use iterfit::cluster::{Clustering, Kmeans};
//!
//! let data = vec![
//!     vec![0.0, 0.0],
//!     vec![0.1, 0.1],
//!     vec![10.0, 10.0],
//!     vec![10.1, 10.1],
//! ];
//!
//! let labels = Kmeans::new(2).with_seed(42).fit_predict(&data).unwrap();
//! assert_eq!(labels[0], labels[1]);  // First two together
//! assert_ne!(labels[0], labels[2]);  // Separate from last two
//!
//! // Every intermediate (labels, centroids) pair, for plotting.
//! let trace = Kmeans::new(2).with_seed(42).trace(&data).unwrap();
//! for step in &trace {
//!     assert_eq!(step.labels.len(), 4);
//! }
//! ```

mod kmeans;
mod traits;

pub use kmeans::{predict, Kmeans, KmeansFit, KmeansStep, KmeansSteps, KmeansTrace};
pub use traits::Clustering;
