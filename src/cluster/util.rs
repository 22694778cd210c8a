use super::matrix::Matrix;

/// Squared Euclidean distance: `Σ (aᵢ - bᵢ)²`.
///
/// Both slices must have the same length.
#[inline]
pub fn squared_euclidean(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Index of the closest centroid row and its squared distance.
///
/// Ties go to the lowest index.
#[inline]
pub(crate) fn nearest(point: &[f64], centroids: &Matrix) -> (usize, f64) {
    let mut best_cluster = 0;
    let mut best_dist = f64::INFINITY;
    for (k, centroid) in centroids.rows().enumerate() {
        let dist = squared_euclidean(point, centroid);
        // Strict `<` keeps the first minimum.
        if dist < best_dist {
            best_dist = dist;
            best_cluster = k;
        }
    }
    (best_cluster, best_dist)
}
