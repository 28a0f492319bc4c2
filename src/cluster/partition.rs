//! Partition types shared by all clustering algorithms.

use crate::distance::DistanceMatrix;
use crate::response::AnswerSet;
use serde::{Deserialize, Serialize};

/// Representative of one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Representative {
    /// Synthetic per-question aggregate answer (k-means family). A question
    /// no member answered stays absent.
    Centroid(AnswerSet),
    /// Index of the member record chosen as medoid (k-medoids).
    Medoid(usize),
}

/// One cluster: its member record indices plus a representative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Member record indices, ascending.
    pub members: Vec<usize>,
    /// The cluster's representative.
    pub representative: Representative,
}

/// A complete partition of one record batch into `k` disjoint, non-empty
/// clusters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partition {
    clusters: Vec<Cluster>,
    assignments: Vec<usize>,
}

impl Partition {
    /// Assemble a partition from a flat assignment vector and per-cluster
    /// representatives. `representatives.len()` fixes `k`; members are
    /// grouped in ascending record order.
    pub(crate) fn from_assignments(
        assignments: Vec<usize>,
        representatives: Vec<Representative>,
    ) -> Self {
        let mut members: Vec<Vec<usize>> = vec![Vec::new(); representatives.len()];
        for (record, &cluster) in assignments.iter().enumerate() {
            members[cluster].push(record);
        }
        let clusters = members
            .into_iter()
            .zip(representatives)
            .map(|(members, representative)| Cluster {
                members,
                representative,
            })
            .collect();
        Self {
            clusters,
            assignments,
        }
    }

    /// Number of clusters.
    pub fn k(&self) -> usize {
        self.clusters.len()
    }

    /// Number of records covered.
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Whether the partition covers no records.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Cluster index per record.
    pub fn assignments(&self) -> &[usize] {
        &self.assignments
    }

    /// The clusters, indexed by cluster id.
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Within-cluster dispersion: for each cluster, the sum of squared
    /// pairwise member distances divided by cluster size, summed over all
    /// clusters. Used by the elbow heuristic and the Calinski-Harabasz
    /// identity.
    pub(crate) fn within_dispersion(&self, matrix: &DistanceMatrix) -> f32 {
        self.clusters
            .iter()
            .map(|cluster| {
                let m = cluster.members.len();
                if m < 2 {
                    return 0.0;
                }
                let mut sum = 0.0f32;
                for (a, &i) in cluster.members.iter().enumerate() {
                    for &j in &cluster.members[a + 1..] {
                        let d = matrix.get(i, j);
                        sum += d * d;
                    }
                }
                sum / m as f32
            })
            .sum()
    }
}
