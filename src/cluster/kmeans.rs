//! K-means clustering.
//!
//! Partitions data into k clusters by minimizing the **within-cluster sum of
//! squares** (SSE):
//!
//! ```text
//! SSE = Σₖ Σᵢ∈Cₖ ||xᵢ - μₖ||²
//! ```
//!
//! [`Kmeans`] is the configuration entry point. It validates the input, picks the
//! random source (seeded `StdRng` or thread-local entropy) and hands off to
//! [`LloydEngine`].
//!
//! # Initialization
//!
//! Every point starts with a uniformly random label. There is no k-means++ style
//! seeding: early cycles are slower, but a valid start can never degenerate into
//! duplicate seeds.
//!
//! # Failure Modes
//!
//! - **Local optima**: different seeds can reach different partitions
//! - **Empty clusters**: with few points per cluster a random start can leave a
//!   cluster without members; see [`EmptyClusterPolicy`]

use super::engine::{EmptyClusterPolicy, LloydEngine, LloydParams};
use super::matrix::Matrix;
use super::traits::Clustering;
use super::util::{nearest, squared_euclidean};
use crate::error::{Error, Result};
use rand::prelude::*;

/// K-means clustering algorithm.
#[derive(Debug, Clone)]
pub struct Kmeans {
    /// Number of clusters.
    k: usize,
    /// Loop controls.
    params: LloydParams,
    /// Random seed.
    seed: Option<u64>,
}

impl Kmeans {
    /// Create a new K-means clusterer.
    ///
    /// Defaults: `max_iter = 300`, `tol = 0.0` (exact convergence), empty clusters
    /// are an error, no seed.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            params: LloydParams::default(),
            seed: None,
        }
    }

    /// Set maximum iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.params.max_iter = max_iter;
        self
    }

    /// Set convergence tolerance (maximum absolute centroid shift).
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.params.tol = tol;
        self
    }

    /// Set empty-cluster handling.
    pub fn with_empty_cluster(mut self, policy: EmptyClusterPolicy) -> Self {
        self.params.empty_cluster = policy;
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Replace all loop controls at once.
    pub fn with_params(mut self, params: LloydParams) -> Self {
        self.params = params;
        self
    }

    /// Loop controls.
    pub fn params(&self) -> &LloydParams {
        &self.params
    }

    /// Fit on row vectors.
    pub fn fit(&self, data: &[Vec<f64>]) -> Result<KmeansFit> {
        let rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };
        self.fit_with_rng(data, rng)
    }

    /// Fit on row vectors using a caller-supplied random source.
    ///
    /// The configured seed is ignored.
    pub fn fit_with_rng<R: Rng>(&self, data: &[Vec<f64>], rng: R) -> Result<KmeansFit> {
        let matrix = Matrix::from_rows(data)?;
        self.fit_matrix(matrix, rng)
    }

    /// Fit on an already built matrix.
    pub fn fit_matrix<R: Rng>(&self, data: Matrix, rng: R) -> Result<KmeansFit> {
        self.params.validate()?;
        LloydEngine::new(data, self.k, rng)?
            .with_params(self.params.clone())
            .fit()
    }
}

impl Clustering for Kmeans {
    fn fit_predict(&self, data: &[Vec<f64>]) -> Result<Vec<usize>> {
        Ok(self.fit(data)?.into_parts().0)
    }

    fn n_clusters(&self) -> usize {
        self.k
    }
}

/// A converged k-means model.
#[derive(Clone, Debug)]
pub struct KmeansFit {
    labels: Vec<usize>,
    centroids: Matrix,
    iterations: usize,
    cluster_sse: Vec<f64>,
    total_sse: f64,
}

impl KmeansFit {
    pub(crate) fn new(
        data: &Matrix,
        labels: Vec<usize>,
        centroids: Matrix,
        iterations: usize,
    ) -> Self {
        let mut cluster_sse = vec![0.0; centroids.nrows()];
        for (point, &label) in data.rows().zip(labels.iter()) {
            cluster_sse[label] += squared_euclidean(point, centroids.row(label));
        }
        let total_sse = cluster_sse.iter().sum();

        Self {
            labels,
            centroids,
            iterations,
            cluster_sse,
            total_sse,
        }
    }

    /// Final label of every observation.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Final centroids, one row per cluster.
    pub fn centroids(&self) -> &Matrix {
        &self.centroids
    }

    /// Number of cycles run, including the converging one.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Total within-cluster sum of squared errors.
    pub fn total_sse(&self) -> f64 {
        self.total_sse
    }

    /// Within-cluster SSE per cluster.
    pub fn cluster_sse(&self) -> &[f64] {
        &self.cluster_sse
    }

    /// Number of clusters.
    pub fn n_clusters(&self) -> usize {
        self.centroids.nrows()
    }

    /// Member count per cluster.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_clusters()];
        for &label in &self.labels {
            sizes[label] += 1;
        }
        sizes
    }

    /// Nearest centroid for a new point.
    pub fn predict(&self, point: &[f64]) -> Result<usize> {
        if point.len() != self.centroids.ncols() {
            return Err(Error::DimensionMismatch {
                expected: self.centroids.ncols(),
                found: point.len(),
            });
        }
        Ok(nearest(point, &self.centroids).0)
    }

    /// Split into `(labels, centroids, iterations, total_sse)`.
    pub fn into_parts(self) -> (Vec<usize>, Matrix, usize, f64) {
        (self.labels, self.centroids, self.iterations, self.total_sse)
    }
}
