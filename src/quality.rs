//! Partition-quality evaluators.
//!
//! All three metrics work from the pairwise distance matrix alone, so they
//! apply uniformly to centroid- and medoid-based partitions:
//!
//! - **Silhouette** (Rousseeuw 1987): per record, `(b - a) / max(a, b)`
//!   where `a` is the mean distance to same-cluster members and `b` the
//!   mean distance to the nearest other cluster; the score is the mean
//!   over all records. Range \[-1, 1\], higher is better.
//! - **Calinski-Harabasz** (1974): between- over within-cluster
//!   dispersion, scaled by `(N - k) / (k - 1)`. Dispersions come from the
//!   pairwise identity `Σ d²(i, j) / |c|` so no centroid is needed.
//!   Unbounded above, higher is better.
//! - **Davies-Bouldin** (1979): mean over clusters of the worst
//!   `(scatter_i + scatter_j) / d(rep_i, rep_j)` ratio, with the
//!   matrix-medoid of each cluster as its representative. Lower is
//!   better; the score carries its [`ScoreDirection`] so callers can
//!   compare metrics uniformly without sign juggling.
//!
//! Every evaluator requires at least two clusters and guards the
//! degenerate all-identical-records case (zero distances produce a score
//! of 0, never NaN).

use crate::cluster::Partition;
use crate::distance::DistanceMatrix;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Whether larger or smaller values of a metric indicate a better
/// partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreDirection {
    /// Larger values are better (Silhouette, Calinski-Harabasz).
    HigherIsBetter,
    /// Smaller values are better (Davies-Bouldin).
    LowerIsBetter,
}

/// Partition-quality metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityMetric {
    /// Mean silhouette coefficient, in \[-1, 1\].
    Silhouette,
    /// Calinski-Harabasz variance-ratio criterion.
    CalinskiHarabasz,
    /// Davies-Bouldin index.
    DaviesBouldin,
}

/// A computed quality score, tagged with its metric and direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    /// The raw metric value.
    pub value: f32,
    /// Which metric produced the value.
    pub metric: QualityMetric,
    /// How to compare two values of this metric.
    pub direction: ScoreDirection,
}

impl QualityMetric {
    /// Short stable name used in logs and configuration.
    pub fn name(&self) -> &'static str {
        match self {
            QualityMetric::Silhouette => "silhouette",
            QualityMetric::CalinskiHarabasz => "calinski-harabasz",
            QualityMetric::DaviesBouldin => "davies-bouldin",
        }
    }

    /// Comparison direction of this metric.
    pub fn direction(&self) -> ScoreDirection {
        match self {
            QualityMetric::Silhouette | QualityMetric::CalinskiHarabasz => {
                ScoreDirection::HigherIsBetter
            }
            QualityMetric::DaviesBouldin => ScoreDirection::LowerIsBetter,
        }
    }

    /// Score `partition` against the distances it was built from.
    ///
    /// Fails with [`Error::InsufficientClusters`] when the partition has
    /// fewer than two clusters.
    pub fn evaluate(&self, matrix: &DistanceMatrix, partition: &Partition) -> Result<QualityScore> {
        if partition.k() < 2 {
            return Err(Error::InsufficientClusters {
                actual: partition.k(),
            });
        }
        let value = match self {
            QualityMetric::Silhouette => silhouette(matrix, partition),
            QualityMetric::CalinskiHarabasz => calinski_harabasz(matrix, partition),
            QualityMetric::DaviesBouldin => davies_bouldin(matrix, partition),
        };
        Ok(QualityScore {
            value,
            metric: *self,
            direction: self.direction(),
        })
    }
}

fn silhouette(matrix: &DistanceMatrix, partition: &Partition) -> f32 {
    let n = partition.len();
    let clusters = partition.clusters();
    let mut total = 0.0f32;

    for (i, &own) in partition.assignments().iter().enumerate() {
        // Singletons contribute 0 by convention.
        if clusters[own].members.len() < 2 {
            continue;
        }
        let a = matrix.mean_distance(i, &clusters[own].members);
        let b = clusters
            .iter()
            .enumerate()
            .filter(|&(c, _)| c != own)
            .map(|(_, cluster)| matrix.mean_distance(i, &cluster.members))
            .fold(f32::INFINITY, f32::min);

        let denom = a.max(b);
        if denom > f32::EPSILON {
            total += (b - a) / denom;
        }
    }

    total / n as f32
}

fn calinski_harabasz(matrix: &DistanceMatrix, partition: &Partition) -> f32 {
    let n = partition.len();
    let k = partition.k();

    let within = partition.within_dispersion(matrix);
    let mut total = 0.0f32;
    for i in 0..n {
        for j in (i + 1)..n {
            let d = matrix.get(i, j);
            total += d * d;
        }
    }
    total /= n as f32;
    let between = (total - within).max(0.0);

    if within <= f32::EPSILON {
        // All clusters perfectly tight; identical records score 0 rather
        // than dividing by zero.
        return if between <= f32::EPSILON {
            0.0
        } else {
            f32::INFINITY
        };
    }

    (between / (k - 1) as f32) / (within / (n - k) as f32)
}

fn davies_bouldin(matrix: &DistanceMatrix, partition: &Partition) -> f32 {
    let clusters = partition.clusters();
    let k = clusters.len();

    // Representative of each cluster for this metric: its matrix-medoid.
    let medoids: Vec<usize> = clusters
        .iter()
        .map(|cluster| matrix_medoid(matrix, &cluster.members))
        .collect();
    let scatters: Vec<f32> = clusters
        .iter()
        .zip(&medoids)
        .map(|(cluster, &m)| matrix.mean_distance(m, &cluster.members))
        .collect();

    let mut total = 0.0f32;
    for i in 0..k {
        let mut worst = 0.0f32;
        for j in 0..k {
            if i == j {
                continue;
            }
            let separation = matrix.get(medoids[i], medoids[j]);
            let ratio = if separation > f32::EPSILON {
                (scatters[i] + scatters[j]) / separation
            } else if scatters[i] + scatters[j] > f32::EPSILON {
                f32::INFINITY
            } else {
                // Coincident, perfectly tight clusters.
                0.0
            };
            worst = worst.max(ratio);
        }
        total += worst;
    }

    total / k as f32
}

fn matrix_medoid(matrix: &DistanceMatrix, members: &[usize]) -> usize {
    let mut best = members[0];
    let mut best_cost = f32::INFINITY;
    for &i in members {
        let cost: f32 = members.iter().map(|&j| matrix.get(i, j)).sum();
        if cost < best_cost {
            best_cost = cost;
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::Representative;

    fn two_pairs() -> DistanceMatrix {
        DistanceMatrix::from_values(
            4,
            vec![
                0.0, 0.1, 0.9, 0.9, //
                0.1, 0.0, 0.9, 0.9, //
                0.9, 0.9, 0.0, 0.1, //
                0.9, 0.9, 0.1, 0.0,
            ],
        )
    }

    fn pair_partition() -> Partition {
        Partition::from_assignments(
            vec![0, 0, 1, 1],
            vec![Representative::Medoid(0), Representative::Medoid(2)],
        )
    }

    fn mismatched_partition() -> Partition {
        // Splits each tight pair across clusters.
        Partition::from_assignments(
            vec![0, 1, 0, 1],
            vec![Representative::Medoid(0), Representative::Medoid(1)],
        )
    }

    #[test]
    fn silhouette_stays_in_range_and_prefers_good_partitions() {
        let matrix = two_pairs();
        let good = QualityMetric::Silhouette
            .evaluate(&matrix, &pair_partition())
            .unwrap();
        let bad = QualityMetric::Silhouette
            .evaluate(&matrix, &mismatched_partition())
            .unwrap();

        assert!((-1.0..=1.0).contains(&good.value));
        assert!((-1.0..=1.0).contains(&bad.value));
        assert!(good.value > bad.value);
        assert_eq!(good.direction, ScoreDirection::HigherIsBetter);
    }

    #[test]
    fn calinski_harabasz_prefers_good_partitions() {
        let matrix = two_pairs();
        let good = QualityMetric::CalinskiHarabasz
            .evaluate(&matrix, &pair_partition())
            .unwrap();
        let bad = QualityMetric::CalinskiHarabasz
            .evaluate(&matrix, &mismatched_partition())
            .unwrap();
        assert!(good.value > bad.value);
    }

    #[test]
    fn davies_bouldin_is_lower_for_good_partitions() {
        let matrix = two_pairs();
        let good = QualityMetric::DaviesBouldin
            .evaluate(&matrix, &pair_partition())
            .unwrap();
        let bad = QualityMetric::DaviesBouldin
            .evaluate(&matrix, &mismatched_partition())
            .unwrap();

        assert_eq!(good.direction, ScoreDirection::LowerIsBetter);
        assert!(good.value < bad.value);
    }

    #[test]
    fn single_cluster_is_insufficient() {
        let matrix = two_pairs();
        let partition =
            Partition::from_assignments(vec![0, 0, 0, 0], vec![Representative::Medoid(0)]);

        for metric in [
            QualityMetric::Silhouette,
            QualityMetric::CalinskiHarabasz,
            QualityMetric::DaviesBouldin,
        ] {
            let err = metric.evaluate(&matrix, &partition).unwrap_err();
            assert_eq!(err, Error::InsufficientClusters { actual: 1 });
        }
    }

    #[test]
    fn identical_records_score_zero_without_numerical_failure() {
        let matrix = DistanceMatrix::from_values(4, vec![0.0; 16]);
        let partition = pair_partition();

        for metric in [
            QualityMetric::Silhouette,
            QualityMetric::CalinskiHarabasz,
            QualityMetric::DaviesBouldin,
        ] {
            let score = metric.evaluate(&matrix, &partition).unwrap();
            assert_eq!(score.value, 0.0, "{}", metric.name());
            assert!(!score.value.is_nan());
        }
    }
}
