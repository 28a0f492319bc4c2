//! The analysis orchestrator.
//!
//! [`AnalysisEngine`] holds the currently selected algorithm/initializer
//! pair, evaluator, and cluster count, drives a full analysis run, and
//! caches the artifacts of the last successful run for querying. It is an
//! explicitly constructed, caller-owned value: no singleton, no ambient
//! state. `analyze` takes `&mut self`, so the borrow checker serializes
//! runs on one engine; for long runs, [`AnalysisEngine::analyze_in_background`]
//! moves the engine onto a worker thread and hands back a handle to wait
//! on (no cancellation).
//!
//! Which initializer may seed which algorithm is a fixed table:
//!
//! | algorithm          | initializers        |
//! |--------------------|---------------------|
//! | `kmeans`           | `random`, `kmeans++` |
//! | `kmeans-optimized` | `random`, `kmeans++` |
//! | `kmedoids`         | `greedy`            |
//!
//! A failed `analyze` never clobbers the previously cached result.

use crate::cluster::{
    AnalysisInput, Initializer, KMeans, KMeansOptimized, KMedoids, Partition, Partitioner,
};
use crate::distance::{DistanceMatrix, ResponseDistance};
use crate::error::{Error, Result};
use crate::projection::{self, ProjectedPoint};
use crate::quality::{QualityMetric, QualityScore};
use crate::response::{ResponseRecord, Schema};
use crate::select;
use tracing::debug;

/// Clustering algorithm selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmKind {
    /// Lloyd's k-means with synthetic mixed-type centroids.
    KMeans,
    /// K-means with cached record-to-centroid distances; same output.
    KMeansOptimized,
    /// PAM-style k-medoids; representatives are real records.
    KMedoids,
}

impl AlgorithmKind {
    /// Short stable name used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            AlgorithmKind::KMeans => "kmeans",
            AlgorithmKind::KMeansOptimized => "kmeans-optimized",
            AlgorithmKind::KMedoids => "kmedoids",
        }
    }

    fn parse(name: &str) -> Result<Self> {
        match normalize(name).as_str() {
            "kmeans" => Ok(AlgorithmKind::KMeans),
            "kmeansoptimized" => Ok(AlgorithmKind::KMeansOptimized),
            "kmedoids" => Ok(AlgorithmKind::KMedoids),
            _ => Err(Error::UnknownAlgorithm(name.to_string())),
        }
    }
}

fn parse_initializer(name: &str) -> Result<Initializer> {
    match normalize(name).as_str() {
        "random" => Ok(Initializer::Random),
        "kmeans++" | "kmeansplusplus" => Ok(Initializer::KmeansPlusPlus),
        "greedy" => Ok(Initializer::Greedy),
        _ => Err(Error::UnknownInitializer(name.to_string())),
    }
}

fn parse_evaluator(name: &str) -> Result<QualityMetric> {
    match normalize(name).as_str() {
        "silhouette" => Ok(QualityMetric::Silhouette),
        "calinskiharabasz" => Ok(QualityMetric::CalinskiHarabasz),
        "daviesbouldin" => Ok(QualityMetric::DaviesBouldin),
        _ => Err(Error::UnknownEvaluator(name.to_string())),
    }
}

/// Lowercase and strip separators, so `"KMeans-Optimized"` and
/// `"kmeans_optimized"` both resolve.
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Allowed initializers per algorithm.
const COMPATIBILITY: &[(AlgorithmKind, &[Initializer])] = &[
    (
        AlgorithmKind::KMeans,
        &[Initializer::Random, Initializer::KmeansPlusPlus],
    ),
    (
        AlgorithmKind::KMeansOptimized,
        &[Initializer::Random, Initializer::KmeansPlusPlus],
    ),
    (AlgorithmKind::KMedoids, &[Initializer::Greedy]),
];

fn check_compatibility(algorithm: AlgorithmKind, initializer: Initializer) -> Result<()> {
    let allowed = COMPATIBILITY
        .iter()
        .find(|(a, _)| *a == algorithm)
        .map(|(_, inits)| *inits)
        .unwrap_or(&[]);
    if allowed.contains(&initializer) {
        Ok(())
    } else {
        Err(Error::IncompatiblePair {
            algorithm: algorithm.name(),
            initializer: initializer.name(),
        })
    }
}

/// Cluster count: fixed by the caller, or resolved by the elbow heuristic
/// at analysis time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KChoice {
    Auto,
    Fixed(usize),
}

/// Artifacts of one successful analysis run.
#[derive(Debug, Clone)]
struct AnalysisOutcome {
    matrix: DistanceMatrix,
    partition: Partition,
    quality: Option<QualityScore>,
    respondents: Vec<String>,
}

/// Caller-owned orchestrator for response clustering runs.
///
/// Defaults: k-means seeded by k-means++, silhouette evaluation, K
/// auto-selected by the elbow heuristic.
#[derive(Debug, Clone)]
pub struct AnalysisEngine {
    algorithm: AlgorithmKind,
    initializer: Initializer,
    evaluator: QualityMetric,
    k: KChoice,
    seed: Option<u64>,
    max_auto_k: usize,
    metric: ResponseDistance,
    outcome: Option<AnalysisOutcome>,
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisEngine {
    /// Create an engine with default configuration.
    pub fn new() -> Self {
        Self {
            algorithm: AlgorithmKind::KMeans,
            initializer: Initializer::KmeansPlusPlus,
            evaluator: QualityMetric::Silhouette,
            k: KChoice::Auto,
            seed: None,
            max_auto_k: 10,
            metric: ResponseDistance::new(),
            outcome: None,
        }
    }

    /// Fix the RNG seed for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Replace the distance metric configuration.
    pub fn with_metric(mut self, metric: ResponseDistance) -> Self {
        self.metric = metric;
        self
    }

    /// Cap the candidate range of the auto K selection.
    pub fn with_max_auto_k(mut self, max_auto_k: usize) -> Self {
        self.max_auto_k = max_auto_k.max(1);
        self
    }

    /// Select the algorithm/initializer pair by name.
    ///
    /// Fails with [`Error::UnknownAlgorithm`], [`Error::UnknownInitializer`],
    /// or [`Error::IncompatiblePair`]; the engine configuration is
    /// unchanged on failure.
    pub fn set_algorithm_and_initializer(
        &mut self,
        algorithm: &str,
        initializer: &str,
    ) -> Result<()> {
        let algorithm = AlgorithmKind::parse(algorithm)?;
        let initializer = parse_initializer(initializer)?;
        check_compatibility(algorithm, initializer)?;
        self.algorithm = algorithm;
        self.initializer = initializer;
        Ok(())
    }

    /// Select the quality evaluator by name.
    pub fn set_evaluator(&mut self, evaluator: &str) -> Result<()> {
        self.evaluator = parse_evaluator(evaluator)?;
        Ok(())
    }

    /// Fix the cluster count. Fails with [`Error::InvalidK`] on zero; the
    /// upper bound is checked against the record count at analysis time.
    pub fn set_k(&mut self, k: usize) -> Result<()> {
        if k == 0 {
            return Err(Error::InvalidK {
                requested: 0,
                n_records: 0,
            });
        }
        self.k = KChoice::Fixed(k);
        Ok(())
    }

    /// Revert to elbow-based K selection at analysis time.
    pub fn set_auto_k(&mut self) {
        self.k = KChoice::Auto;
    }

    /// Run the elbow heuristic on `records` now, fix the engine's K to
    /// the result, and return it.
    pub fn auto_select_k(&mut self, records: &[ResponseRecord], schema: &Schema) -> Result<usize> {
        validate_batch(records)?;
        let matrix = DistanceMatrix::from_records(records, schema, &self.metric)?;
        let input = AnalysisInput {
            records,
            schema,
            matrix: &matrix,
            metric: &self.metric,
        };
        let k = select::select_k(&input, self.build_algorithm().as_ref(), self.max_auto_k)?;
        self.k = KChoice::Fixed(k);
        Ok(k)
    }

    /// The currently selected cluster count, if fixed.
    pub fn k(&self) -> Option<usize> {
        match self.k {
            KChoice::Fixed(k) => Some(k),
            KChoice::Auto => None,
        }
    }

    /// Run a full analysis: distance matrix, clustering, quality.
    ///
    /// Validates that `records` is non-empty and of uniform provenance,
    /// resolves a pending auto K, and caches all artifacts on success.
    /// For K = 1 the quality step is skipped, since partition quality is
    /// undefined below two clusters, and [`AnalysisEngine::quality_score`]
    /// reports [`Error::InsufficientClusters`] for that run.
    ///
    /// On failure the previously cached result, if any, stays available.
    pub fn analyze(&mut self, records: &[ResponseRecord], schema: &Schema) -> Result<()> {
        validate_batch(records)?;

        let matrix = DistanceMatrix::from_records(records, schema, &self.metric)?;
        let input = AnalysisInput {
            records,
            schema,
            matrix: &matrix,
            metric: &self.metric,
        };
        let algorithm = self.build_algorithm();

        let k = match self.k {
            KChoice::Fixed(k) => k,
            KChoice::Auto => select::select_k(&input, algorithm.as_ref(), self.max_auto_k)?,
        };
        debug!(
            n_records = records.len(),
            k,
            algorithm = algorithm.name(),
            initializer = self.initializer.name(),
            "starting analysis"
        );

        let partition = algorithm.partition(&input, k)?;
        let quality = if k >= 2 {
            Some(self.evaluator.evaluate(&matrix, &partition)?)
        } else {
            None
        };
        debug!(
            k = partition.k(),
            quality = quality.as_ref().map(|q| q.value as f64),
            "analysis finished"
        );

        let respondents = records
            .iter()
            .map(|r| r.respondent().to_string())
            .collect();
        self.outcome = Some(AnalysisOutcome {
            matrix,
            partition,
            quality,
            respondents,
        });
        Ok(())
    }

    /// Move the engine onto a worker thread and analyze there.
    ///
    /// The returned [`AnalysisTask`] yields the engine back together with
    /// the analysis outcome; there is no cancellation.
    pub fn analyze_in_background(
        mut self,
        records: Vec<ResponseRecord>,
        schema: Schema,
    ) -> AnalysisTask {
        AnalysisTask {
            handle: std::thread::spawn(move || {
                let result = self.analyze(&records, &schema);
                (self, result)
            }),
        }
    }

    /// The partition of the last successful run.
    pub fn partition(&self) -> Result<&Partition> {
        Ok(&self.cached()?.partition)
    }

    /// Respondent ids per cluster, indexed by cluster id.
    pub fn cluster_members(&self) -> Result<Vec<Vec<&str>>> {
        let outcome = self.cached()?;
        Ok(outcome
            .partition
            .clusters()
            .iter()
            .map(|cluster| {
                cluster
                    .members
                    .iter()
                    .map(|&i| outcome.respondents[i].as_str())
                    .collect()
            })
            .collect())
    }

    /// The full pairwise distance matrix of the last successful run.
    pub fn global_distances(&self) -> Result<&DistanceMatrix> {
        Ok(&self.cached()?.matrix)
    }

    /// Per-cluster distance sub-matrices, indexed by cluster id. Row and
    /// column order inside each sub-matrix follows the cluster's member
    /// list.
    pub fn cluster_distances(&self) -> Result<Vec<DistanceMatrix>> {
        let outcome = self.cached()?;
        Ok(outcome
            .partition
            .clusters()
            .iter()
            .map(|cluster| outcome.matrix.submatrix(&cluster.members))
            .collect())
    }

    /// The quality score of the last successful run.
    ///
    /// Reports [`Error::InsufficientClusters`] for a K = 1 run, where no
    /// score is defined.
    pub fn quality_score(&self) -> Result<QualityScore> {
        let outcome = self.cached()?;
        outcome.quality.ok_or(Error::InsufficientClusters {
            actual: outcome.partition.k(),
        })
    }

    /// 2D MDS projection of all analyzed records, tagged with their
    /// cluster ids.
    pub fn project(&self) -> Result<Vec<ProjectedPoint>> {
        let outcome = self.cached()?;
        let assignments = outcome.partition.assignments();
        Ok(projection::project(&outcome.matrix)
            .into_iter()
            .enumerate()
            .map(|(record, (x, y))| ProjectedPoint {
                x,
                y,
                record,
                cluster: assignments[record],
            })
            .collect())
    }

    /// 2D MDS projection of one cluster, computed on its distance
    /// sub-matrix. Point record indices refer to the original batch.
    ///
    /// # Panics
    ///
    /// Panics if `cluster` is not a valid cluster id of the last run.
    pub fn project_cluster(&self, cluster: usize) -> Result<Vec<ProjectedPoint>> {
        let outcome = self.cached()?;
        let members = &outcome.partition.clusters()[cluster].members;
        let submatrix = outcome.matrix.submatrix(members);
        Ok(projection::project(&submatrix)
            .into_iter()
            .zip(members)
            .map(|((x, y), &record)| ProjectedPoint {
                x,
                y,
                record,
                cluster,
            })
            .collect())
    }

    fn cached(&self) -> Result<&AnalysisOutcome> {
        self.outcome.as_ref().ok_or(Error::NoAnalysisYet)
    }

    fn build_algorithm(&self) -> Box<dyn Partitioner> {
        match self.algorithm {
            AlgorithmKind::KMeans => {
                let mut model = KMeans::new(self.initializer);
                if let Some(seed) = self.seed {
                    model = model.with_seed(seed);
                }
                Box::new(model)
            }
            AlgorithmKind::KMeansOptimized => {
                let mut model = KMeansOptimized::new(self.initializer);
                if let Some(seed) = self.seed {
                    model = model.with_seed(seed);
                }
                Box::new(model)
            }
            AlgorithmKind::KMedoids => {
                let mut model = KMedoids::new(self.initializer);
                if let Some(seed) = self.seed {
                    model = model.with_seed(seed);
                }
                Box::new(model)
            }
        }
    }
}

/// Handle to an analysis running on a worker thread.
pub struct AnalysisTask {
    handle: std::thread::JoinHandle<(AnalysisEngine, Result<()>)>,
}

impl AnalysisTask {
    /// Block until the analysis finishes, yielding the engine back
    /// together with the outcome.
    pub fn wait(self) -> (AnalysisEngine, Result<()>) {
        self.handle
            .join()
            .expect("analysis worker thread panicked")
    }
}

/// Shared non-empty and uniform-provenance validation.
fn validate_batch(records: &[ResponseRecord]) -> Result<()> {
    let Some(first) = records.first() else {
        return Err(Error::EmptyResponseSet);
    };
    for record in &records[1..] {
        if record.survey() != first.survey() {
            return Err(Error::MixedProvenance {
                expected: first.survey().to_string(),
                found: record.survey().to_string(),
            });
        }
    }
    Ok(())
}
