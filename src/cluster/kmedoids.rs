//! K-medoids (PAM-style) over the pairwise distance matrix.
//!
//! # Algorithm
//!
//! Medoids are real records, so mixed-type data needs no synthetic
//! centroid: every distance the algorithm needs is already in the matrix.
//!
//! 1. Seed `k` medoids (the engine pairs this algorithm with the greedy
//!    facility-location initializer).
//! 2. Assign every record to its nearest medoid; each medoid anchors its
//!    own cluster.
//! 3. For every cluster, find the member that minimizes the total
//!    within-cluster distance; swap it in as medoid only on strict
//!    improvement.
//! 4. Repeat from 2 until no swap improves the cost or the iteration cap
//!    is hit (the cap is not an error; the last partition is returned).
//!
//! Assignment ties break toward the lowest cluster index.

use crate::cluster::init::Initializer;
use crate::cluster::partition::{Partition, Representative};
use crate::cluster::traits::{check_k, AnalysisInput, Partitioner};
use crate::distance::DistanceMatrix;
use crate::error::Result;
use rand::prelude::*;
use tracing::trace;

/// Iteration cap for the swap loop.
pub(crate) const MAX_ITERATIONS: usize = 100;

/// K-medoids clustering.
#[derive(Debug, Clone)]
pub struct KMedoids {
    initializer: Initializer,
    max_iter: usize,
    seed: Option<u64>,
}

impl KMedoids {
    /// Create a k-medoids instance seeded by `initializer`.
    pub fn new(initializer: Initializer) -> Self {
        Self {
            initializer,
            max_iter: MAX_ITERATIONS,
            seed: None,
        }
    }

    /// Set the iteration cap.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Fix the RNG seed (only relevant for randomized initializers).
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Partitioner for KMedoids {
    fn partition(&self, input: &AnalysisInput<'_>, k: usize) -> Result<Partition> {
        let n = input.len();
        check_k(k, n)?;

        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };
        let mut medoids = self.initializer.select_seeds(input.matrix, k, &mut rng);
        let mut assignments = assign(input.matrix, &medoids);

        for iter in 0..self.max_iter {
            let mut improved = false;

            for c in 0..k {
                let members: Vec<usize> = (0..n).filter(|&i| assignments[i] == c).collect();
                let current_cost = within_cost(input.matrix, &members, medoids[c]);

                let mut best = medoids[c];
                let mut best_cost = current_cost;
                for &candidate in &members {
                    let cost = within_cost(input.matrix, &members, candidate);
                    if cost < best_cost {
                        best_cost = cost;
                        best = candidate;
                    }
                }

                if best != medoids[c] {
                    trace!(
                        cluster = c,
                        old = medoids[c],
                        new = best,
                        "medoid swap"
                    );
                    medoids[c] = best;
                    improved = true;
                }
            }

            if !improved {
                trace!(iterations = iter, "k-medoids converged");
                break;
            }
            assignments = assign(input.matrix, &medoids);
        }

        let representatives = medoids.into_iter().map(Representative::Medoid).collect();
        Ok(Partition::from_assignments(assignments, representatives))
    }

    fn name(&self) -> &'static str {
        "kmedoids"
    }
}

/// Nearest-medoid assignment; every medoid anchors its own cluster so no
/// cluster can come out empty.
fn assign(matrix: &DistanceMatrix, medoids: &[usize]) -> Vec<usize> {
    let n = matrix.len();
    let mut assignments = vec![0usize; n];
    for i in 0..n {
        let mut best = 0usize;
        let mut best_dist = matrix.get(i, medoids[0]);
        for (c, &m) in medoids.iter().enumerate().skip(1) {
            let d = matrix.get(i, m);
            if d < best_dist {
                best = c;
                best_dist = d;
            }
        }
        assignments[i] = best;
    }
    for (c, &m) in medoids.iter().enumerate() {
        assignments[m] = c;
    }
    assignments
}

fn within_cost(matrix: &DistanceMatrix, members: &[usize], medoid: usize) -> f32 {
    members.iter().map(|&i| matrix.get(i, medoid)).sum()
}
