//! K-means clustering of scalar samples
//!
//! Lloyd iterations on a 1-D feature (standardized backscatter). Seeding
//! is deterministic: centroids start at evenly spaced quantiles of the
//! sorted samples, so identical input always converges to identical
//! centroids.

use crate::maybe_rayon::*;
use floodsar_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Parameters for K-means clustering
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KmeansParams {
    /// Number of clusters
    pub k: usize,
    /// Maximum iterations (default: 300)
    pub max_iterations: usize,
    /// Stop when no centroid moves more than this (default: 1e-4)
    pub convergence: f64,
}

impl Default for KmeansParams {
    fn default() -> Self {
        Self {
            k: 2,
            max_iterations: 300,
            convergence: 1e-4,
        }
    }
}

/// Result of a K-means run
#[derive(Debug, Clone, PartialEq)]
pub struct KmeansFit {
    /// Final centroids, in seeding order (ascending initial value)
    pub centroids: Vec<f64>,
    /// Members per centroid after the last assignment
    pub counts: Vec<usize>,
    /// Iterations performed
    pub iterations: usize,
}

impl KmeansFit {
    /// Index of the centroid nearest to `value`; ties go to the lower index.
    pub fn nearest(&self, value: f64) -> usize {
        nearest(&self.centroids, value)
    }
}

fn nearest(centroids: &[f64], value: f64) -> usize {
    let mut best_dist = f64::INFINITY;
    let mut best_k = 0;
    for (k, &centroid) in centroids.iter().enumerate() {
        let dist = (value - centroid).abs();
        if dist < best_dist {
            best_dist = dist;
            best_k = k;
        }
    }
    best_k
}

/// K-means on scalar samples.
///
/// Non-finite samples are ignored. Fewer samples than clusters is allowed:
/// seeding then repeats values and the surplus clusters stay empty, keeping
/// their seed centroid.
///
/// # Errors
/// `k < 2`, or no finite sample at all.
pub fn kmeans_1d(values: &[f64], params: &KmeansParams) -> Result<KmeansFit> {
    if params.k < 2 {
        return Err(Error::Algorithm("K-means requires k >= 2".into()));
    }

    let values: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if values.is_empty() {
        return Err(Error::Algorithm("K-means needs at least one finite sample".into()));
    }

    let mut centroids = initialize_centroids(&values, params.k);
    let mut labels = vec![0usize; values.len()];
    let mut counts = vec![0usize; params.k];
    let mut iterations = 0;

    for _ in 0..params.max_iterations {
        iterations += 1;

        // Assignment step
        let current = &centroids;
        labels.par_iter_mut().enumerate().for_each(|(i, label)| {
            *label = nearest(current, values[i]);
        });

        // Update step
        let mut sums = vec![0.0; params.k];
        counts = vec![0usize; params.k];
        for (&v, &k) in values.iter().zip(labels.iter()) {
            sums[k] += v;
            counts[k] += 1;
        }

        let mut max_shift = 0.0_f64;
        for k in 0..params.k {
            if counts[k] > 0 {
                let updated = sums[k] / counts[k] as f64;
                max_shift = max_shift.max((updated - centroids[k]).abs());
                centroids[k] = updated;
            }
        }

        if max_shift < params.convergence {
            break;
        }
    }

    Ok(KmeansFit {
        centroids,
        counts,
        iterations,
    })
}

/// Evenly spaced quantiles of the sorted samples.
fn initialize_centroids(values: &[f64], k: usize) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    (0..k)
        .map(|i| {
            let idx = (i * n / k) + n / (2 * k);
            sorted[idx.min(n - 1)]
        })
        .collect()
}
