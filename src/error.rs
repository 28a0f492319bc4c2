use thiserror::Error;

/// Errors returned by the analysis engine and its components.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Algorithm name not recognized by the engine.
    #[error("unknown algorithm: {0:?}")]
    UnknownAlgorithm(String),

    /// Initializer name not recognized by the engine.
    #[error("unknown initializer: {0:?}")]
    UnknownInitializer(String),

    /// Evaluator name not recognized by the engine.
    #[error("unknown evaluator: {0:?}")]
    UnknownEvaluator(String),

    /// The algorithm/initializer pair is not in the compatibility table.
    #[error("initializer {initializer:?} cannot seed algorithm {algorithm:?}")]
    IncompatiblePair {
        /// Recognized algorithm name.
        algorithm: &'static str,
        /// Recognized initializer name.
        initializer: &'static str,
    },

    /// Requested cluster count is incompatible with the dataset.
    #[error("invalid cluster count: requested {requested}, but dataset has {n_records} records")]
    InvalidK {
        /// Requested number of clusters.
        requested: usize,
        /// Number of records in the dataset.
        n_records: usize,
    },

    /// An operation that needs at least one record received none.
    #[error("empty response set")]
    EmptyResponseSet,

    /// Records in one batch originate from different surveys.
    #[error("mixed provenance: expected survey {expected:?}, found {found:?}")]
    MixedProvenance {
        /// Survey id of the first record.
        expected: String,
        /// Conflicting survey id.
        found: String,
    },

    /// Partition quality is undefined for fewer than two clusters.
    #[error("insufficient clusters: evaluation needs at least 2, got {actual}")]
    InsufficientClusters {
        /// Cluster count of the offending partition.
        actual: usize,
    },

    /// Two records share no question answered by both sides.
    #[error("no comparable questions between respondents {a:?} and {b:?}")]
    NoComparableQuestions {
        /// First respondent id.
        a: String,
        /// Second respondent id.
        b: String,
    },

    /// An accessor was called before a successful analysis run.
    #[error("no analysis has completed yet")]
    NoAnalysisYet,
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;
