//! The Lloyd iteration engine.
//!
//! # The Loop
//!
//! Starting from a random labelling, each cycle
//!
//! 1. **Update centroids**: every centroid becomes the mean of its current members
//! 2. **Update clusters**: every point moves to its nearest centroid
//! 3. **Test convergence**: stop once the centroids no longer move
//!
//! Both update steps are exposed as pure functions ([`compute_centroids`],
//! [`assign_labels`]); [`LloydEngine`] owns the mutable state (labels, the previous
//! centroid snapshot, the iteration counter) and the random source.
//!
//! # Convergence
//!
//! The default tolerance is `0.0`: the loop halts only when the freshly computed
//! centroids are element-wise equal to the previous ones, or when reassignment left
//! every label untouched (which implies the next recomputation would be equal).
//! A positive tolerance stops on the maximum absolute centroid shift instead; in
//! that case the final centroids are recomputed from the final labels so the
//! returned pair stays consistent.
//!
//! # Empty Clusters
//!
//! The mean of zero points is undefined. [`EmptyClusterPolicy`] decides what happens:
//! fail, keep the previous centroid, or move the centroid onto a random observation.

use super::kmeans::KmeansFit;
use super::matrix::Matrix;
use super::util::{nearest, squared_euclidean};
use crate::error::{Error, Result};
use rand::Rng;
use tracing::{debug, info, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// What to do when a cluster ends up with no members.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EmptyClusterPolicy {
    /// Abort the fit with [`Error::EmptyCluster`].
    #[default]
    Error,
    /// Keep the centroid from the previous cycle (zeros on the first cycle).
    RetainPrevious,
    /// Move the centroid onto an observation drawn uniformly at random.
    Reseed,
}

/// How a centroid row was produced during one cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CentroidOutcome {
    /// Mean of the cluster's members.
    Recomputed,
    /// Empty cluster; previous centroid kept.
    Retained,
    /// Empty cluster; centroid moved onto a random observation.
    Reseeded,
}

/// Loop controls shared by [`LloydEngine`] and [`Kmeans`](super::Kmeans).
#[derive(Clone, Debug)]
pub struct LloydParams {
    /// Maximum number of cycles before giving up with [`Error::NonConvergence`].
    pub max_iter: usize,

    /// Convergence tolerance on the maximum absolute centroid shift.
    ///
    /// `0.0` requires exact equality.
    pub tol: f64,

    /// Empty-cluster handling.
    pub empty_cluster: EmptyClusterPolicy,
}

impl Default for LloydParams {
    fn default() -> Self {
        Self {
            max_iter: 300,
            tol: 0.0,
            empty_cluster: EmptyClusterPolicy::Error,
        }
    }
}

impl LloydParams {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.max_iter == 0 {
            return Err(Error::InvalidParameter {
                name: "max_iter",
                message: "must be at least 1",
            });
        }
        if !(self.tol >= 0.0 && self.tol.is_finite()) {
            return Err(Error::InvalidParameter {
                name: "tol",
                message: "must be finite and non-negative",
            });
        }
        Ok(())
    }
}

/// Summary of one completed cycle.
#[derive(Clone, Debug)]
pub struct StepReport {
    /// 1-based index of the cycle.
    pub iteration: usize,

    /// Number of observations whose label changed during reassignment.
    pub labels_changed: usize,

    /// Largest absolute difference between the new and the previous centroids.
    pub max_shift: f64,

    /// Whether this cycle reached the stopping condition.
    pub converged: bool,

    /// Per-cluster provenance of the new centroids.
    pub outcomes: Vec<CentroidOutcome>,
}

/// Per-cluster member means and member counts.
///
/// Rows of empty clusters are left at zero; callers decide how to fill them.
pub fn compute_centroids(data: &Matrix, labels: &[usize], k: usize) -> (Matrix, Vec<usize>) {
    debug_assert_eq!(labels.len(), data.nrows());

    let mut centroids = Matrix::zeros(k, data.ncols());
    let mut counts = vec![0usize; k];

    for (point, &label) in data.rows().zip(labels.iter()) {
        counts[label] += 1;
        for (s, &x) in centroids.row_mut(label).iter_mut().zip(point.iter()) {
            *s += x;
        }
    }

    for (cluster, &count) in counts.iter().enumerate() {
        if count > 0 {
            let count = count as f64;
            for s in centroids.row_mut(cluster) {
                *s /= count;
            }
        }
    }

    (centroids, counts)
}

/// Nearest-centroid label for every observation (ties go to the lowest index).
pub fn assign_labels(data: &Matrix, centroids: &Matrix) -> Vec<usize> {
    debug_assert_eq!(data.ncols(), centroids.ncols());

    // Each row is independent, so both paths produce identical labels.
    #[cfg(feature = "parallel")]
    let labels = data
        .as_slice()
        .par_chunks_exact(data.ncols())
        .map(|point| nearest(point, centroids).0)
        .collect();

    #[cfg(not(feature = "parallel"))]
    let labels = data
        .rows()
        .map(|point| nearest(point, centroids).0)
        .collect();

    labels
}

/// Sum of squared distances from every observation to its labelled centroid.
pub fn sse(data: &Matrix, labels: &[usize], centroids: &Matrix) -> f64 {
    data.rows()
        .zip(labels.iter())
        .map(|(point, &label)| squared_euclidean(point, centroids.row(label)))
        .sum()
}

/// Lloyd's algorithm over an owned observation matrix.
///
/// ```
/// use lloyd::{LloydEngine, Matrix};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let data = Matrix::from_rows(&[
///     vec![0.0, 0.0],
///     vec![0.0, 2.0],
///     vec![2.0, 0.0],
///     vec![2.0, 2.0],
/// ])
/// .unwrap();
///
/// let fit = LloydEngine::new(data, 2, StdRng::seed_from_u64(0))
///     .unwrap()
///     .with_initial_labels(vec![0, 1, 0, 1])
///     .unwrap()
///     .fit()
///     .unwrap();
///
/// assert_eq!(fit.centroids().row(0), &[1.0, 0.0]);
/// assert_eq!(fit.centroids().row(1), &[1.0, 2.0]);
/// assert_eq!(fit.total_sse(), 4.0);
/// ```
#[derive(Debug)]
pub struct LloydEngine<R> {
    data: Matrix,
    k: usize,
    rng: R,
    params: LloydParams,
    labels: Vec<usize>,
    /// Centroids from the most recent cycle; the baseline for the next comparison.
    centroids: Matrix,
    iterations: usize,
    initialized: bool,
    converged: bool,
}

impl<R: Rng> LloydEngine<R> {
    /// Create an engine for `k` clusters.
    ///
    /// Labels and centroids start zeroed; no randomness is drawn until
    /// [`initialize`](Self::initialize) (or the first [`step`](Self::step)).
    pub fn new(data: Matrix, k: usize, rng: R) -> Result<Self> {
        let n = data.nrows();
        if k == 0 || k > n {
            return Err(Error::InvalidClusterCount {
                requested: k,
                n_items: n,
            });
        }

        let centroids = Matrix::zeros(k, data.ncols());
        Ok(Self {
            data,
            k,
            rng,
            params: LloydParams::default(),
            labels: vec![0; n],
            centroids,
            iterations: 0,
            initialized: false,
            converged: false,
        })
    }

    /// Replace the loop controls.
    pub fn with_params(mut self, params: LloydParams) -> Self {
        self.params = params;
        self
    }

    /// Start from the given labels instead of a random assignment.
    pub fn with_initial_labels(mut self, labels: Vec<usize>) -> Result<Self> {
        if labels.len() != self.data.nrows() {
            return Err(Error::DimensionMismatch {
                expected: self.data.nrows(),
                found: labels.len(),
            });
        }
        if labels.iter().any(|&l| l >= self.k) {
            return Err(Error::InvalidParameter {
                name: "labels",
                message: "every label must be less than k",
            });
        }
        self.labels = labels;
        self.initialized = true;
        Ok(self)
    }

    /// Assign every observation an independent, uniformly random label in `[0, k)`.
    pub fn initialize(&mut self) {
        for label in self.labels.iter_mut() {
            *label = self.rng.random_range(0..self.k);
        }
        self.initialized = true;
    }

    /// Run one cycle: recompute centroids, reassign, test convergence.
    pub fn step(&mut self) -> Result<StepReport> {
        self.params.validate()?;
        if !self.initialized {
            self.initialize();
        }

        let iteration = self.iterations + 1;

        let (mut candidate, counts) = compute_centroids(&self.data, &self.labels, self.k);
        let outcomes = self.resolve_empty(&mut candidate, &counts, iteration)?;

        let assigned = assign_labels(&self.data, &candidate);
        let mut labels_changed = 0;
        for (label, new) in self.labels.iter_mut().zip(assigned) {
            if *label != new {
                *label = new;
                labels_changed += 1;
            }
        }
        self.iterations = iteration;

        let max_shift = candidate.max_abs_diff(&self.centroids);
        let converged = labels_changed == 0 || max_shift <= self.params.tol;

        if converged && labels_changed > 0 {
            // Tolerance stop: candidate no longer matches the labels it produced.
            let (mut settled, counts) = compute_centroids(&self.data, &self.labels, self.k);
            self.centroids = candidate;
            self.resolve_empty(&mut settled, &counts, iteration)?;
            self.centroids = settled;
        } else {
            self.centroids = candidate;
        }
        self.converged = converged;

        debug!(iteration, labels_changed, max_shift, converged, "lloyd iteration");

        Ok(StepReport {
            iteration,
            labels_changed,
            max_shift,
            converged,
            outcomes,
        })
    }

    /// Run cycles until convergence and return the fitted model.
    ///
    /// Initializes labels randomly unless they were supplied or already drawn.
    pub fn fit(mut self) -> Result<KmeansFit> {
        self.params.validate()?;
        info!(
            n = self.data.nrows(),
            dim = self.data.ncols(),
            k = self.k,
            "fitting k-means"
        );

        while !self.converged {
            if self.iterations >= self.params.max_iter {
                warn!(max_iter = self.params.max_iter, "k-means did not converge");
                return Err(Error::NonConvergence {
                    max_iter: self.params.max_iter,
                });
            }
            self.step()?;
        }

        info!(iterations = self.iterations, "k-means converged");
        Ok(KmeansFit::new(
            &self.data,
            self.labels,
            self.centroids,
            self.iterations,
        ))
    }

    /// Fill rows of empty clusters according to the policy.
    fn resolve_empty(
        &mut self,
        candidate: &mut Matrix,
        counts: &[usize],
        iteration: usize,
    ) -> Result<Vec<CentroidOutcome>> {
        let mut outcomes = Vec::with_capacity(counts.len());
        for (cluster, &count) in counts.iter().enumerate() {
            if count > 0 {
                outcomes.push(CentroidOutcome::Recomputed);
                continue;
            }
            match self.params.empty_cluster {
                EmptyClusterPolicy::Error => {
                    return Err(Error::EmptyCluster { cluster, iteration });
                }
                EmptyClusterPolicy::RetainPrevious => {
                    warn!(cluster, iteration, "empty cluster, retaining previous centroid");
                    candidate
                        .row_mut(cluster)
                        .copy_from_slice(self.centroids.row(cluster));
                    outcomes.push(CentroidOutcome::Retained);
                }
                EmptyClusterPolicy::Reseed => {
                    let idx = self.rng.random_range(0..self.data.nrows());
                    warn!(cluster, iteration, observation = idx, "empty cluster, reseeding");
                    candidate.row_mut(cluster).copy_from_slice(self.data.row(idx));
                    outcomes.push(CentroidOutcome::Reseeded);
                }
            }
        }
        Ok(outcomes)
    }

    /// The observation matrix.
    pub fn data(&self) -> &Matrix {
        &self.data
    }

    /// Current labels.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Centroids produced by the most recent cycle (zeros before the first).
    pub fn centroids(&self) -> &Matrix {
        &self.centroids
    }

    /// Completed cycles.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Whether the last cycle met the stopping condition.
    pub fn is_converged(&self) -> bool {
        self.converged
    }

    /// Number of clusters.
    pub fn n_clusters(&self) -> usize {
        self.k
    }

    /// Loop controls.
    pub fn params(&self) -> &LloydParams {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn matrix(rows: &[&[f64]]) -> Matrix {
        let rows: Vec<Vec<f64>> = rows.iter().map(|r| r.to_vec()).collect();
        Matrix::from_rows(&rows).unwrap()
    }

    fn square() -> Matrix {
        matrix(&[&[0.0, 0.0], &[0.0, 2.0], &[2.0, 0.0], &[2.0, 2.0]])
    }

    /// 1-D points where labelling everything 0 empties cluster 1.
    fn lopsided() -> LloydEngine<StdRng> {
        LloydEngine::new(matrix(&[&[0.0], &[1.0], &[10.0]]), 2, StdRng::seed_from_u64(3))
            .unwrap()
            .with_initial_labels(vec![0, 0, 0])
            .unwrap()
    }

    fn params(empty_cluster: EmptyClusterPolicy) -> LloydParams {
        LloydParams {
            empty_cluster,
            ..Default::default()
        }
    }

    #[test]
    fn compute_centroids_takes_member_means() {
        let (c, counts) = compute_centroids(&square(), &[0, 1, 0, 1], 2);
        assert_eq!(counts, vec![2, 2]);
        assert_eq!(c.row(0), &[1.0, 0.0]);
        assert_eq!(c.row(1), &[1.0, 2.0]);
    }

    #[test]
    fn compute_centroids_leaves_empty_rows_zeroed() {
        let (c, counts) = compute_centroids(&square(), &[0, 0, 0, 0], 3);
        assert_eq!(counts, vec![4, 0, 0]);
        assert_eq!(c.row(0), &[1.0, 1.0]);
        assert_eq!(c.row(1), &[0.0, 0.0]);
        assert!(c.as_slice().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn assign_labels_uses_first_minimum() {
        let data = matrix(&[&[0.0], &[5.0], &[10.0]]);
        let centroids = matrix(&[&[0.0], &[10.0]]);
        // 5.0 is equidistant; the lower index wins.
        assert_eq!(assign_labels(&data, &centroids), vec![0, 0, 1]);
    }

    #[test]
    fn square_example_converges_in_one_cycle() {
        let fit = LloydEngine::new(square(), 2, StdRng::seed_from_u64(0))
            .unwrap()
            .with_initial_labels(vec![0, 1, 0, 1])
            .unwrap()
            .fit()
            .unwrap();

        assert_eq!(fit.labels(), &[0, 1, 0, 1]);
        assert_eq!(fit.centroids().row(0), &[1.0, 0.0]);
        assert_eq!(fit.centroids().row(1), &[1.0, 2.0]);
        assert_eq!(fit.iterations(), 1);
        assert_eq!(fit.total_sse(), 4.0);
        assert_eq!(fit.cluster_sse(), &[2.0, 2.0]);
    }

    #[test]
    fn single_cluster_is_global_mean() {
        let data = matrix(&[&[1.0, 2.0], &[3.0, 6.0], &[5.0, 10.0]]);
        let fit = LloydEngine::new(data, 1, StdRng::seed_from_u64(11))
            .unwrap()
            .fit()
            .unwrap();

        assert_eq!(fit.labels(), &[0, 0, 0]);
        assert_eq!(fit.iterations(), 1);
        assert_eq!(fit.centroids().row(0), &[3.0, 6.0]);
        assert_eq!(fit.total_sse(), 4.0 + 16.0 + 0.0 + 0.0 + 4.0 + 16.0);
    }

    #[test]
    fn one_point_per_cluster_has_zero_sse() {
        let data = matrix(&[&[0.0, 1.0], &[4.0, -2.0], &[7.5, 3.0], &[-1.0, -1.0]]);
        let fit = LloydEngine::new(data.clone(), 4, StdRng::seed_from_u64(0))
            .unwrap()
            .with_initial_labels(vec![2, 0, 3, 1])
            .unwrap()
            .fit()
            .unwrap();

        assert_eq!(fit.iterations(), 1);
        assert_eq!(fit.total_sse(), 0.0);
        assert_eq!(fit.labels(), &[2, 0, 3, 1]);
        for (i, &label) in fit.labels().iter().enumerate() {
            assert_eq!(fit.centroids().row(label), data.row(i));
        }
    }

    #[test]
    fn rejects_bad_cluster_counts() {
        assert!(matches!(
            LloydEngine::new(square(), 0, StdRng::seed_from_u64(0)),
            Err(Error::InvalidClusterCount { requested: 0, n_items: 4 })
        ));
        let err = LloydEngine::new(square(), 5, StdRng::seed_from_u64(0)).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn rejects_bad_initial_labels() {
        let engine = LloydEngine::new(square(), 2, StdRng::seed_from_u64(0)).unwrap();
        assert!(matches!(
            engine.with_initial_labels(vec![0, 1]),
            Err(Error::DimensionMismatch { expected: 4, found: 2 })
        ));
        let engine = LloydEngine::new(square(), 2, StdRng::seed_from_u64(0)).unwrap();
        assert!(engine.with_initial_labels(vec![0, 1, 2, 0]).is_err());
    }

    #[test]
    fn rejects_bad_params() {
        let engine = LloydEngine::new(square(), 2, StdRng::seed_from_u64(0))
            .unwrap()
            .with_params(LloydParams {
                tol: -1.0,
                ..Default::default()
            });
        assert!(matches!(
            engine.fit(),
            Err(Error::InvalidParameter { name: "tol", .. })
        ));

        let mut engine = LloydEngine::new(square(), 2, StdRng::seed_from_u64(0))
            .unwrap()
            .with_params(LloydParams {
                max_iter: 0,
                ..Default::default()
            });
        assert!(engine.step().is_err());
        assert_eq!(engine.iterations(), 0);
    }

    #[test]
    fn initialize_draws_valid_labels() {
        let data = Matrix::from_shape_vec(50, 1, (0..50).map(f64::from).collect()).unwrap();
        let mut a = LloydEngine::new(data.clone(), 3, StdRng::seed_from_u64(9)).unwrap();
        let mut b = LloydEngine::new(data, 3, StdRng::seed_from_u64(9)).unwrap();
        a.initialize();
        b.initialize();
        assert!(a.labels().iter().all(|&l| l < 3));
        assert_eq!(a.labels(), b.labels());
    }

    #[test]
    fn empty_cluster_errors_by_default() {
        let err = lopsided().fit().unwrap_err();
        assert!(matches!(
            err,
            Error::EmptyCluster {
                cluster: 1,
                iteration: 1
            }
        ));
        assert!(!err.is_configuration());
    }

    #[test]
    fn empty_cluster_can_retain_previous() {
        let mut engine = lopsided().with_params(params(EmptyClusterPolicy::RetainPrevious));

        let report = engine.step().unwrap();
        assert_eq!(
            report.outcomes,
            vec![CentroidOutcome::Recomputed, CentroidOutcome::Retained]
        );
        // Retained row is the zero-initialized centroid.
        assert_eq!(engine.centroids().row(1), &[0.0]);
        assert_eq!(engine.labels(), &[1, 1, 0]);
        assert_eq!(report.labels_changed, 2);
        assert!(!report.converged);

        let report = engine.step().unwrap();
        assert!(report.converged);
        assert_eq!(report.outcomes, vec![CentroidOutcome::Recomputed; 2]);

        let fit = engine.fit().unwrap();
        assert_eq!(fit.iterations(), 2);
        assert_eq!(fit.centroids().row(0), &[10.0]);
        assert_eq!(fit.centroids().row(1), &[0.5]);
        assert_eq!(fit.total_sse(), 0.5);
    }

    #[test]
    fn empty_cluster_can_reseed() {
        let mut engine = lopsided().with_params(params(EmptyClusterPolicy::Reseed));

        let report = engine.step().unwrap();
        assert_eq!(report.outcomes[1], CentroidOutcome::Reseeded);
        let reseeded = engine.centroids().row(1).to_vec();
        assert!(engine.data().rows().any(|row| row == reseeded.as_slice()));

        let fit = engine.fit().unwrap();
        assert!(fit.centroids().as_slice().iter().all(|v| v.is_finite()));
        assert!(fit.labels().iter().all(|&l| l < 2));
    }

    #[test]
    fn iteration_cap_surfaces_non_convergence() {
        let engine = lopsided().with_params(LloydParams {
            max_iter: 1,
            empty_cluster: EmptyClusterPolicy::RetainPrevious,
            ..Default::default()
        });
        assert!(matches!(
            engine.fit(),
            Err(Error::NonConvergence { max_iter: 1 })
        ));
    }

    #[test]
    fn tolerance_stop_recomputes_centroids_from_final_labels() {
        let engine = lopsided().with_params(LloydParams {
            tol: 1e9,
            empty_cluster: EmptyClusterPolicy::RetainPrevious,
            ..Default::default()
        });
        let fit = engine.fit().unwrap();

        assert_eq!(fit.iterations(), 1);
        assert_eq!(fit.labels(), &[1, 1, 0]);
        assert_eq!(fit.centroids().row(0), &[10.0]);
        assert_eq!(fit.centroids().row(1), &[0.5]);
    }

    #[test]
    fn sse_never_increases_between_cycles() {
        let mut rng = StdRng::seed_from_u64(5);
        let flat: Vec<f64> = (0..120).map(|_| rng.random_range(-10.0..10.0)).collect();
        let data = Matrix::from_shape_vec(60, 2, flat).unwrap();

        let mut engine = LloydEngine::new(data, 4, StdRng::seed_from_u64(17))
            .unwrap()
            .with_params(params(EmptyClusterPolicy::RetainPrevious));

        let mut last = f64::INFINITY;
        for _ in 0..100 {
            let report = engine.step().unwrap();
            let current = sse(engine.data(), engine.labels(), engine.centroids());
            assert!(
                current <= last + 1e-9,
                "sse rose from {last} to {current} at iteration {}",
                report.iteration
            );
            last = current;
            if report.converged {
                break;
            }
        }
        assert!(engine.is_converged());
    }
}
