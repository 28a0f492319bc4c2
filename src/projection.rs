//! Classical multidimensional scaling (MDS) for 2D visualization.
//!
//! # Algorithm (Torgerson 1952)
//!
//! Given an N×N distance matrix `D`:
//!
//! 1. Square the distances element-wise.
//! 2. Double-center: `B = -1/2 · J · D² · J` with `J = I - (1/n) · 𝟙𝟙ᵀ`.
//! 3. Eigendecompose the symmetric matrix `B`.
//! 4. Keep the two largest eigenvalues λ₁, λ₂ and their eigenvectors;
//!    the output coordinate of record i is
//!    `(v₁[i] · √max(λ₁, 0), v₂[i] · √max(λ₂, 0))`.
//!
//! Negative eigenvalues (the metric is not exactly Euclidean) are clamped
//! to zero before the square root. Distances are preserved approximately,
//! not exactly. The output is for plotting, nothing else.
//!
//! The eigendecomposition is a cyclic Jacobi iteration kept in-crate; for
//! symmetric matrices of visualization size it converges in a handful of
//! sweeps and spares the crate a linear-algebra backend. It runs in f64
//! to keep the centering subtraction well-conditioned, emitting f32
//! coordinates.

use crate::distance::DistanceMatrix;
use serde::{Deserialize, Serialize};

/// Jacobi sweep cap; symmetric matrices converge long before this.
const MAX_SWEEPS: usize = 64;
/// Off-diagonal norm below which the iteration stops.
const CONVERGENCE_EPS: f64 = 1e-12;

/// One record's 2D coordinate, tagged with its record index and cluster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    /// First MDS coordinate.
    pub x: f32,
    /// Second MDS coordinate.
    pub y: f32,
    /// Index of the record in the analyzed batch.
    pub record: usize,
    /// Cluster id of the record at projection time.
    pub cluster: usize,
}

/// Project a distance matrix to one 2D coordinate per record.
///
/// `n == 1` yields the single point at the origin; `n == 0` yields no
/// points.
pub fn project(matrix: &DistanceMatrix) -> Vec<(f32, f32)> {
    let n = matrix.len();
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![(0.0, 0.0)];
    }

    // Double-centered squared distances.
    let mut b = vec![0.0f64; n * n];
    let mut row_means = vec![0.0f64; n];
    let mut grand_mean = 0.0f64;
    for i in 0..n {
        for j in 0..n {
            let d = matrix.get(i, j) as f64;
            let sq = d * d;
            b[i * n + j] = sq;
            row_means[i] += sq;
        }
        row_means[i] /= n as f64;
        grand_mean += row_means[i];
    }
    grand_mean /= n as f64;
    for i in 0..n {
        for j in 0..n {
            b[i * n + j] = -0.5 * (b[i * n + j] - row_means[i] - row_means[j] + grand_mean);
        }
    }

    let (eigenvalues, eigenvectors) = jacobi_eigen(&mut b, n);

    // Indices of the two largest eigenvalues.
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| eigenvalues[b].total_cmp(&eigenvalues[a]));
    let (first, second) = (order[0], order[1]);

    let scale_x = eigenvalues[first].max(0.0).sqrt();
    let scale_y = eigenvalues[second].max(0.0).sqrt();

    (0..n)
        .map(|i| {
            (
                (eigenvectors[i * n + first] * scale_x) as f32,
                (eigenvectors[i * n + second] * scale_y) as f32,
            )
        })
        .collect()
}

/// Cyclic Jacobi eigendecomposition of a symmetric matrix.
///
/// `a` is destroyed; returns the eigenvalues and a row-major matrix whose
/// *columns* are the corresponding eigenvectors.
fn jacobi_eigen(a: &mut [f64], n: usize) -> (Vec<f64>, Vec<f64>) {
    // Eigenvector accumulator, starts as the identity.
    let mut v = vec![0.0f64; n * n];
    for i in 0..n {
        v[i * n + i] = 1.0;
    }

    for _ in 0..MAX_SWEEPS {
        let mut off = 0.0f64;
        for i in 0..n {
            for j in (i + 1)..n {
                off += a[i * n + j] * a[i * n + j];
            }
        }
        if off <= CONVERGENCE_EPS {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[p * n + q];
                if apq.abs() <= f64::EPSILON {
                    continue;
                }
                let app = a[p * n + p];
                let aqq = a[q * n + q];

                // Rotation angle zeroing a[p][q]: tan(2θ) = 2·apq / (aqq − app).
                let theta = 0.5 * (2.0 * apq).atan2(aqq - app);
                let (s, c) = theta.sin_cos();

                for i in 0..n {
                    let aip = a[i * n + p];
                    let aiq = a[i * n + q];
                    a[i * n + p] = c * aip - s * aiq;
                    a[i * n + q] = s * aip + c * aiq;
                }
                for j in 0..n {
                    let apj = a[p * n + j];
                    let aqj = a[q * n + j];
                    a[p * n + j] = c * apj - s * aqj;
                    a[q * n + j] = s * apj + c * aqj;
                }
                for i in 0..n {
                    let vip = v[i * n + p];
                    let viq = v[i * n + q];
                    v[i * n + p] = c * vip - s * viq;
                    v[i * n + q] = s * vip + c * viq;
                }
            }
        }
    }

    let eigenvalues = (0..n).map(|i| a[i * n + i]).collect();
    (eigenvalues, v)
}
