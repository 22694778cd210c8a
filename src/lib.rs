//! Lloyd's-algorithm k-means.
//!
//! `lloyd` partitions a dense `f64` matrix into a fixed number of clusters by
//! alternating centroid recomputation and nearest-centroid reassignment until the
//! centroids reach a fixed point.
//!
//! The primary public API is under [`cluster`], which provides:
//! - [`Kmeans`]: builder-style configuration and the [`Clustering`] entry point
//! - [`LloydEngine`]: the fit loop itself, with an injected random source
//! - [`compute_centroids`] / [`assign_labels`]: the two pure update steps

#![forbid(unsafe_code)]

pub mod cluster;
pub mod error;

pub use cluster::{
    assign_labels, compute_centroids, squared_euclidean, sse, CentroidOutcome, Clustering,
    EmptyClusterPolicy, Kmeans, KmeansFit, LloydEngine, LloydParams, Matrix, StepReport,
};
pub use error::{Error, Result};
