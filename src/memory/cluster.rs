//! Coarse semantic clustering of entry embeddings.
//!
//! Clustering is a fallback retrieval signal, exposed behind the narrow
//! [`Clusterer`] trait (vectors in, assignments and centroids out) so any
//! compliant routine can be substituted for the built-in [`KMeans`].

use ndarray::{Array1, Array2, Axis};

use crate::error::{MemoryError, Result};

/// Result of one clustering run.
#[derive(Debug, Clone)]
pub struct Clustering {
    /// Cluster id per input vector, each in `0..k`.
    pub assignments: Vec<usize>,
    /// Mean vector per cluster, indexed by cluster id.
    pub centroids: Vec<Vec<f32>>,
}

/// Partition vectors into `k` groups.
pub trait Clusterer: std::fmt::Debug + Send + Sync {
    /// Cluster `vectors` into exactly `k` groups. Requires `1 <= k <=
    /// vectors.len()` and uniform dimensions.
    fn cluster(&self, vectors: &[Vec<f32>], k: usize) -> Result<Clustering>;
}

/// Lloyd's k-means with deterministic seeding.
///
/// Initial centroids are the input vectors at evenly spaced indices — no
/// RNG, so repeated rebuilds over unchanged data agree. An iteration
/// reassigns every vector to its nearest centroid (squared Euclidean) and
/// recomputes means; a cluster that loses all members keeps its previous
/// centroid. Stops when assignments are stable or at `max_iterations`.
#[derive(Debug, Clone)]
pub struct KMeans {
    pub max_iterations: usize,
}

impl Default for KMeans {
    fn default() -> Self {
        Self {
            max_iterations: 100,
        }
    }
}

impl Clusterer for KMeans {
    fn cluster(&self, vectors: &[Vec<f32>], k: usize) -> Result<Clustering> {
        let n = vectors.len();
        if k == 0 || k > n {
            return Err(MemoryError::validation(format!(
                "k must be in 1..={n}, got {k}"
            )));
        }
        let dim = vectors[0].len();
        if dim == 0 {
            return Err(MemoryError::validation("vectors must be non-empty"));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
            return Err(MemoryError::validation(format!(
                "vector dimension mismatch: expected {dim}, got {}",
                bad.len()
            )));
        }

        let mut data = Array2::<f64>::zeros((n, dim));
        for (i, vector) in vectors.iter().enumerate() {
            for (j, value) in vector.iter().enumerate() {
                data[[i, j]] = f64::from(*value);
            }
        }

        // Evenly spaced seeding over the input order.
        let mut centroids = Array2::<f64>::zeros((k, dim));
        for cluster in 0..k {
            let seed_row = cluster * n / k;
            centroids.row_mut(cluster).assign(&data.row(seed_row));
        }

        let mut assignments = vec![0usize; n];
        for _ in 0..self.max_iterations.max(1) {
            let next: Vec<usize> = (0..n)
                .map(|i| nearest_centroid(&data.row(i).to_owned(), &centroids))
                .collect();
            let stable = next == assignments;
            assignments = next;

            let mut sums = Array2::<f64>::zeros((k, dim));
            let mut counts = vec![0usize; k];
            for (i, &cluster) in assignments.iter().enumerate() {
                let mut row = sums.row_mut(cluster);
                row += &data.row(i);
                counts[cluster] += 1;
            }
            for cluster in 0..k {
                if counts[cluster] > 0 {
                    let mean = sums.row(cluster).mapv(|v| v / counts[cluster] as f64);
                    centroids.row_mut(cluster).assign(&mean);
                }
                // Empty cluster: previous centroid carries over.
            }

            if stable {
                break;
            }
        }

        let centroids = centroids
            .axis_iter(Axis(0))
            .map(|row| row.iter().map(|v| *v as f32).collect())
            .collect();
        Ok(Clustering {
            assignments,
            centroids,
        })
    }
}

fn nearest_centroid(point: &Array1<f64>, centroids: &Array2<f64>) -> usize {
    let mut best = 0usize;
    let mut best_distance = f64::INFINITY;
    for (cluster, centroid) in centroids.axis_iter(Axis(0)).enumerate() {
        let diff = point - &centroid;
        let distance = diff.dot(&diff);
        if distance < best_distance {
            best_distance = distance;
            best = cluster;
        }
    }
    best
}
