//! Lloyd's-algorithm k-means.
//!
//! ## The Algorithm
//!
//! Assign each point to the nearest centroid, then move each centroid to the mean of
//! its points. Repeat until the centroids stop moving.
//!
//! **Objective**: Minimize within-cluster sum of squares:
//!
//! ```text
//! J = Σ_k Σ_{x ∈ C_k} ||x - μ_k||²
//! ```
//!
//! Neither step can increase `J`, and there are finitely many labellings, so the
//! loop reaches a fixed point. Floating point can in principle make it oscillate,
//! which is why the loop is capped by `max_iter`.
//!
//! **Assumptions**:
//! - Clusters are roughly spherical
//! - Clusters have similar sizes
//! - You know k in advance
//!
//! ## Layout
//!
//! - [`Kmeans`]: configuration, seeding, the [`Clustering`] entry point
//! - [`LloydEngine`]: the fit loop over an owned [`Matrix`]
//! - [`compute_centroids`], [`assign_labels`], [`sse`], [`squared_euclidean`]: pure
//!   building blocks
//!
//! ## Usage
//!
//! ```rust
//! use lloyd::cluster::{Clustering, EmptyClusterPolicy, Kmeans};
//!
//! let data = vec![
//!     vec![0.0, 0.0],
//!     vec![0.1, 0.1],
//!     vec![10.0, 10.0],
//!     vec![10.1, 10.1],
//! ];
//!
//! let fit = Kmeans::new(2)
//!     .with_seed(42)
//!     .with_empty_cluster(EmptyClusterPolicy::Reseed)
//!     .fit(&data)
//!     .unwrap();
//! assert_eq!(fit.labels().len(), 4);
//! assert!(fit.total_sse() >= 0.0);
//!
//! let labels = Kmeans::new(1).fit_predict(&data).unwrap();
//! assert_eq!(labels, vec![0, 0, 0, 0]);
//! ```

mod engine;
mod kmeans;
mod matrix;
mod traits;
mod util;

pub use engine::{
    assign_labels, compute_centroids, sse, CentroidOutcome, EmptyClusterPolicy, LloydEngine,
    LloydParams, StepReport,
};
pub use kmeans::{Kmeans, KmeansFit};
pub use matrix::Matrix;
pub use traits::Clustering;
pub use util::squared_euclidean;
