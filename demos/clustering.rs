//! K-means on a simple 2D dataset.
//!
//! Run with `RUST_LOG=lloyd=debug` to see per-iteration events.

use lloyd::{EmptyClusterPolicy, Kmeans};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Three well-separated clusters in 2D.
    let data: Vec<Vec<f64>> = vec![
        // Cluster A (near origin)
        vec![0.0, 0.0],
        vec![0.1, 0.2],
        vec![0.2, 0.1],
        vec![-0.1, 0.1],
        // Cluster B (near (5, 5))
        vec![5.0, 5.0],
        vec![5.1, 4.9],
        vec![4.9, 5.1],
        vec![5.2, 5.2],
        // Cluster C (near (10, 0))
        vec![10.0, 0.0],
        vec![10.1, 0.1],
        vec![9.9, -0.1],
        vec![10.2, 0.2],
    ];

    let fit = Kmeans::new(3)
        .with_seed(42)
        .with_empty_cluster(EmptyClusterPolicy::Reseed)
        .fit(&data)
        .unwrap();

    println!("=== K-means (k=3) ===");
    for (i, label) in fit.labels().iter().enumerate() {
        println!("  point {:2} ({:5.1}, {:5.1}) => cluster {}", i, data[i][0], data[i][1], label);
    }
    for (k, centroid) in fit.centroids().rows().enumerate() {
        println!("  centroid {} = ({:.3}, {:.3})", k, centroid[0], centroid[1]);
    }
    println!("iterations: {}", fit.iterations());
    println!("total SSE:  {:.4}", fit.total_sse());
}
