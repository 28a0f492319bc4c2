//! Survey response clustering and quality evaluation.
//!
//! `cohort` partitions batches of heterogeneous, semantically-typed survey
//! answers into groups of similar respondents. It provides:
//! - a schema-aware dissimilarity measure over mixed answer types
//!   ([`distance`])
//! - k-means and k-medoids clustering with pluggable seeding strategies
//!   ([`cluster`])
//! - silhouette, Calinski-Harabasz, and Davies-Bouldin partition scoring
//!   ([`quality`])
//! - elbow-based auto-selection of the cluster count ([`select`])
//! - classical MDS projection of the distance structure into 2D for
//!   plotting ([`projection`])
//!
//! The pieces are tied together by [`engine::AnalysisEngine`], a
//! caller-owned orchestrator that validates configuration, drives a full
//! run, and caches the artifacts for querying. The engine consumes
//! in-memory [`response::ResponseRecord`]s and never touches storage or
//! presentation.

#![forbid(unsafe_code)]

pub mod cluster;
pub mod distance;
pub mod engine;
pub mod error;
pub mod projection;
pub mod quality;
pub mod response;
pub mod select;

pub use cluster::{
    AnalysisInput, Cluster, Initializer, KMeans, KMeansOptimized, KMedoids, Partition,
    Partitioner, Representative,
};
pub use distance::{DistanceMatrix, ResponseDistance};
pub use engine::{AlgorithmKind, AnalysisEngine, AnalysisTask};
pub use error::{Error, Result};
pub use projection::ProjectedPoint;
pub use quality::{QualityMetric, QualityScore, ScoreDirection};
pub use response::{AnswerSet, AnswerValue, Question, QuestionKind, ResponseRecord, Schema};
