use crate::cluster::partition::Partition;
use crate::distance::{DistanceMatrix, ResponseDistance};
use crate::error::{Error, Result};
use crate::response::{ResponseRecord, Schema};

/// Immutable inputs of one analysis run, shared by every algorithm.
///
/// The distance matrix is built once by the caller and read-only here;
/// records and schema are only needed by algorithms that synthesize
/// centroids and must measure record-to-centroid distances the matrix
/// cannot answer.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisInput<'a> {
    /// The records being partitioned.
    pub records: &'a [ResponseRecord],
    /// Their shared question schema.
    pub schema: &'a Schema,
    /// Pairwise record distances.
    pub matrix: &'a DistanceMatrix,
    /// The metric that built `matrix`.
    pub metric: &'a ResponseDistance,
}

impl AnalysisInput<'_> {
    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the input holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Common interface for partitioning algorithms (k clusters over a fixed
/// record set).
pub trait Partitioner {
    /// Partition the input into exactly `k` non-empty clusters.
    ///
    /// Fails with [`Error::InvalidK`] when `k` is zero or exceeds the
    /// record count. Non-convergence within the iteration cap is not an
    /// error; the last partition is returned.
    fn partition(&self, input: &AnalysisInput<'_>, k: usize) -> Result<Partition>;

    /// Short stable name used in logs.
    fn name(&self) -> &'static str;
}

/// Shared `k` validation for all algorithms.
pub(crate) fn check_k(k: usize, n_records: usize) -> Result<()> {
    if k < 1 || k > n_records {
        return Err(Error::InvalidK {
            requested: k,
            n_records,
        });
    }
    Ok(())
}
