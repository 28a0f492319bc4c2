//! Elbow-based selection of the cluster count K.
//!
//! Runs the configured algorithm for K = 1..=max_k and records each run's
//! within-cluster dispersion. Dispersion always falls as K grows; the
//! "elbow" is where adding clusters stops paying off. We find it as the
//! point of maximum perpendicular distance from the line connecting the
//! first and last dispersion values, with both axes normalized to \[0, 1\]
//! so neither dominates. Ties break toward the smaller K.

use crate::cluster::{AnalysisInput, Partitioner};
use crate::error::{Error, Result};
use tracing::debug;

/// Pick a cluster count for `input` by the elbow heuristic.
///
/// Runs `algorithm` once per candidate K. The result is always within
/// `1..=min(max_k, N)`. Fails with [`Error::EmptyResponseSet`] when the
/// input holds no records.
pub fn select_k(
    input: &AnalysisInput<'_>,
    algorithm: &dyn Partitioner,
    max_k: usize,
) -> Result<usize> {
    let n = input.len();
    if n == 0 {
        return Err(Error::EmptyResponseSet);
    }

    let max_k = max_k.clamp(1, n);
    if max_k == 1 {
        return Ok(1);
    }

    let mut dispersions = Vec::with_capacity(max_k);
    for k in 1..=max_k {
        let partition = algorithm.partition(input, k)?;
        let dispersion = partition.within_dispersion(input.matrix);
        debug!(
            k,
            dispersion = dispersion as f64,
            algorithm = algorithm.name(),
            "elbow candidate"
        );
        dispersions.push(dispersion);
    }

    Ok(elbow(&dispersions))
}

/// Index (1-based K) of the elbow in a dispersion curve.
fn elbow(dispersions: &[f32]) -> usize {
    let last = dispersions.len() - 1;

    // Normalize both axes; a flat curve has no elbow and yields K = 1.
    let spread = dispersions[0] - dispersions[last];
    if spread.abs() <= f32::EPSILON {
        return 1;
    }

    let mut best_k = 1;
    let mut best_dist = f32::NEG_INFINITY;
    for (i, &d) in dispersions.iter().enumerate() {
        let x = i as f32 / last as f32;
        let y = (dispersions[0] - d) / spread;
        // Perpendicular distance from the normalized chord y = x.
        let dist = (y - x).abs() / std::f32::consts::SQRT_2;
        if dist > best_dist {
            best_dist = dist;
            best_k = i + 1;
        }
    }

    best_k
}
