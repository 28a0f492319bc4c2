//! Clustering algorithms for grouping survey respondents.
//!
//! ## Why two representative flavors
//!
//! Survey answers are mixed-type (numbers, option sets, free text), so a
//! cluster "average" is not a vector mean. The two algorithm families here
//! take opposite positions on that problem:
//!
//! **K-means** builds a *synthetic centroid*: one aggregate answer per
//! question (mean, majority option set, most frequent text). It converges
//! fast and its centroids summarize a cluster nicely, at the cost of the
//! aggregation rules being design choices.
//!
//! **K-medoids** sidesteps synthesis entirely: every representative is a
//! real record, so only pairwise distances are ever needed and the cached
//! distance matrix answers all of them. Slower per iteration, but immune
//! to aggregation artifacts.
//!
//! ## Algorithms
//!
//! - [`KMeans`]: Lloyd's iteration with mixed-type centroids.
//! - [`KMeansOptimized`]: same output, caches record-to-centroid
//!   distances across iterations.
//! - [`KMedoids`]: PAM-style best-member swaps.
//!
//! All three run `Initialized → Assigning → UpdatingRepresentatives`
//! rounds until assignments stabilize or the iteration cap is reached,
//! and break assignment ties toward the lowest cluster index.
//!
//! ## Seeding
//!
//! Initial representatives come from an [`Initializer`]: uniform
//! [`Initializer::Random`] draws, spread-improving
//! [`Initializer::KmeansPlusPlus`], or the deterministic
//! [`Initializer::Greedy`] facility-location heuristic. The engine's
//! compatibility table decides which strategy may seed which algorithm.
//!
//! ## Usage
//!
//! ```rust
//! use cohort::{
//!     AnalysisInput, AnswerValue, DistanceMatrix, Initializer, KMeans, Partitioner, Question,
//!     ResponseDistance, ResponseRecord, Schema,
//! };
//!
//! let schema = Schema::new(vec![Question::numeric("hours", 0, 40)]);
//! let records: Vec<ResponseRecord> = [2, 4, 36, 38]
//!     .iter()
//!     .enumerate()
//!     .map(|(i, &h)| {
//!         ResponseRecord::new(format!("r{i}"), "survey-1")
//!             .with_answer("hours", AnswerValue::number(h))
//!     })
//!     .collect();
//!
//! let metric = ResponseDistance::new();
//! let matrix = DistanceMatrix::from_records(&records, &schema, &metric).unwrap();
//! let input = AnalysisInput {
//!     records: &records,
//!     schema: &schema,
//!     matrix: &matrix,
//!     metric: &metric,
//! };
//!
//! let partition = KMeans::new(Initializer::Random)
//!     .with_seed(42)
//!     .partition(&input, 2)
//!     .unwrap();
//! let labels = partition.assignments();
//! assert_eq!(labels[0], labels[1]); // close records cluster together
//! assert_ne!(labels[0], labels[2]); // far records do not
//! ```

mod init;
mod kmeans;
mod kmedoids;
mod partition;
mod traits;

pub use init::Initializer;
pub use kmeans::{KMeans, KMeansOptimized};
pub use kmedoids::KMedoids;
pub use partition::{Cluster, Partition, Representative};
pub use traits::{AnalysisInput, Partitioner};
