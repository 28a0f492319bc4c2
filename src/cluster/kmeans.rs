//! K-means adapted to mixed-type survey answers.
//!
//! # Algorithm
//!
//! Lloyd's iteration (assign, then update) with one twist: records are not
//! points in a vector space, so each centroid is a
//! *synthetic answer set*: one type-appropriate aggregate answer per
//! schema question:
//!
//! - **Numeric**: rounded mean over the members that answered.
//! - **Choice**: every option selected by at least half of the answering
//!   members; when that majority set is empty, the single most frequent
//!   option.
//! - **FreeText**: the most frequent text (ties break toward the
//!   lexicographically smallest).
//! - A question no member answered stays absent from the centroid.
//!
//! Record-to-centroid distances go through the same schema-aware metric
//! used for the pairwise matrix, so assignment and matrix distances agree.
//!
//! # Convergence
//!
//! The loop stops when an assignment pass changes nothing, or after the
//! iteration cap. Hitting the cap is not an error; the last partition is
//! returned. Assignment ties break toward the lowest cluster index, which
//! together with a seeded initializer makes runs reproducible.
//!
//! [`KMeansOptimized`] produces identical partitions but caches
//! record-to-centroid distances between iterations, recomputing only
//! against centroids that moved in the previous update step.

use crate::cluster::init::Initializer;
use crate::cluster::partition::{Partition, Representative};
use crate::cluster::traits::{check_k, AnalysisInput, Partitioner};
use crate::error::Result;
use crate::response::{AnswerSet, AnswerValue, QuestionKind};
use rand::prelude::*;
use std::collections::BTreeMap;
use tracing::trace;

/// Iteration cap shared by the k-means family.
pub(crate) const MAX_ITERATIONS: usize = 100;

/// K-means over mixed-type survey answers.
#[derive(Debug, Clone)]
pub struct KMeans {
    initializer: Initializer,
    max_iter: usize,
    seed: Option<u64>,
}

impl KMeans {
    /// Create a k-means instance seeded by `initializer`.
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

    /// Fix the RNG seed for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Partitioner for KMeans {
    fn partition(&self, input: &AnalysisInput<'_>, k: usize) -> Result<Partition> {
        lloyd(input, k, self.initializer, self.seed, self.max_iter, false)
    }

    fn name(&self) -> &'static str {
        "kmeans"
    }
}

/// K-means with cached record-to-centroid distances.
///
/// Output-identical to [`KMeans`] given the same seed; only redundant
/// distance computations are skipped.
#[derive(Debug, Clone)]
pub struct KMeansOptimized {
    initializer: Initializer,
    max_iter: usize,
    seed: Option<u64>,
}

impl KMeansOptimized {
    /// Create an optimized k-means instance seeded by `initializer`.
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

    /// Fix the RNG seed for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Partitioner for KMeansOptimized {
    fn partition(&self, input: &AnalysisInput<'_>, k: usize) -> Result<Partition> {
        lloyd(input, k, self.initializer, self.seed, self.max_iter, true)
    }

    fn name(&self) -> &'static str {
        "kmeans-optimized"
    }
}

/// Shared Lloyd loop. `reuse_distances` switches on the caching of
/// record-to-centroid distances across iterations.
fn lloyd(
    input: &AnalysisInput<'_>,
    k: usize,
    initializer: Initializer,
    seed: Option<u64>,
    max_iter: usize,
    reuse_distances: bool,
) -> Result<Partition> {
    let n = input.len();
    check_k(k, n)?;

    let mut rng: Box<dyn RngCore> = match seed {
        Some(s) => Box::new(StdRng::seed_from_u64(s)),
        None => Box::new(rand::rng()),
    };
    let seeds = initializer.select_seeds(input.matrix, k, &mut rng);

    let mut centroids: Vec<AnswerSet> = seeds
        .iter()
        .map(|&s| input.records[s].answers().clone())
        .collect();

    let mut assignments = vec![0usize; n];
    // Record-to-centroid distances; refreshed per column when the centroid
    // moved (always, in the unoptimized variant).
    let mut distances = vec![0.0f32; n * k];
    let mut moved = vec![true; k];

    for iter in 0..max_iter {
        // Assigning.
        for c in 0..k {
            if !moved[c] {
                continue;
            }
            for i in 0..n {
                distances[i * k + c] = input
                    .metric
                    .between(input.records[i].answers(), &centroids[c], input.schema)
                    .unwrap_or(f32::INFINITY);
            }
        }

        let mut changed = iter == 0;
        for i in 0..n {
            let row = &distances[i * k..(i + 1) * k];
            let mut best = assignments[i];
            let mut best_dist = row[best];
            for (c, &d) in row.iter().enumerate() {
                if d < best_dist || (d == best_dist && c < best) {
                    best = c;
                    best_dist = d;
                }
            }
            // A record comparable to no centroid keeps its assignment.
            if best_dist.is_finite() && best != assignments[i] {
                assignments[i] = best;
                changed = true;
            }
        }

        let mut counts = vec![0usize; k];
        for &a in &assignments {
            counts[a] += 1;
        }

        // An empty cluster steals the record farthest from its centroid.
        for c in 0..k {
            if counts[c] > 0 {
                continue;
            }
            let donor = (0..n)
                .filter(|&i| counts[assignments[i]] > 1)
                .max_by(|&a, &b| {
                    distances[a * k + assignments[a]].total_cmp(&distances[b * k + assignments[b]])
                });
            if let Some(i) = donor {
                counts[assignments[i]] -= 1;
                assignments[i] = c;
                counts[c] = 1;
                changed = true;
            }
        }

        if !changed {
            trace!(iterations = iter, "k-means converged");
            break;
        }

        // Updating representatives.
        let mut members: Vec<Vec<usize>> = vec![Vec::new(); k];
        for (i, &a) in assignments.iter().enumerate() {
            members[a].push(i);
        }
        for c in 0..k {
            let next = synthesize_centroid(input, &members[c]);
            moved[c] = if reuse_distances {
                next != centroids[c]
            } else {
                true
            };
            centroids[c] = next;
        }
    }

    let representatives = centroids.into_iter().map(Representative::Centroid).collect();
    Ok(Partition::from_assignments(assignments, representatives))
}

/// Synthesize the per-question aggregate answer set for one cluster.
pub(crate) fn synthesize_centroid(input: &AnalysisInput<'_>, members: &[usize]) -> AnswerSet {
    let mut centroid = AnswerSet::new();
    for question in input.schema.questions() {
        if let Some(answer) = aggregate_question(input, members, &question.id, &question.kind) {
            centroid.insert(question.id.clone(), answer);
        }
    }
    centroid
}

fn aggregate_question(
    input: &AnalysisInput<'_>,
    members: &[usize],
    question_id: &str,
    kind: &QuestionKind,
) -> Option<AnswerValue> {
    match kind {
        QuestionKind::Numeric { .. } => {
            let values: Vec<i64> = members
                .iter()
                .filter_map(|&i| match input.records[i].answer(question_id) {
                    Some(AnswerValue::Numeric(Some(v))) => Some(*v),
                    _ => None,
                })
                .collect();
            if values.is_empty() {
                return None;
            }
            let mean = values.iter().sum::<i64>() as f64 / values.len() as f64;
            Some(AnswerValue::Numeric(Some(mean.round() as i64)))
        }
        QuestionKind::FreeText => {
            let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
            for &i in members {
                if let Some(AnswerValue::FreeText(text)) = input.records[i].answer(question_id) {
                    *counts.entry(text.as_str()).or_insert(0) += 1;
                }
            }
            // BTreeMap iteration order makes the tie-break lexicographic.
            let mut best: Option<(&str, usize)> = None;
            for (text, count) in counts {
                if best.map(|(_, c)| count > c).unwrap_or(true) {
                    best = Some((text, count));
                }
            }
            best.map(|(text, _)| AnswerValue::FreeText(text.to_string()))
        }
        QuestionKind::Choice { total_options, .. } => {
            let mut option_counts = vec![0usize; *total_options];
            let mut answered = 0usize;
            for &i in members {
                if let Some(AnswerValue::Choice(selected)) = input.records[i].answer(question_id) {
                    answered += 1;
                    for &option in selected {
                        if option < *total_options {
                            option_counts[option] += 1;
                        }
                    }
                }
            }
            if answered == 0 {
                return None;
            }
            // Majority set; fall back to the single most frequent option.
            let mut majority: Vec<usize> = (0..*total_options)
                .filter(|&o| option_counts[o] * 2 >= answered && option_counts[o] > 0)
                .collect();
            if majority.is_empty() {
                if let Some(top) = (0..*total_options)
                    .filter(|&o| option_counts[o] > 0)
                    .max_by_key(|&o| (option_counts[o], std::cmp::Reverse(o)))
                {
                    majority.push(top);
                }
            }
            Some(AnswerValue::selection(majority))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::{DistanceMatrix, ResponseDistance};
    use crate::response::{Question, ResponseRecord, Schema};

    fn schema() -> Schema {
        Schema::new(vec![
            Question::numeric("hours", 0, 40),
            Question::choice("tools", 3, false),
            Question::free_text("team"),
        ])
    }

    fn records() -> Vec<ResponseRecord> {
        // Two well-separated groups of two.
        vec![
            ResponseRecord::new("a", "s")
                .with_answer("hours", AnswerValue::number(2))
                .with_answer("tools", AnswerValue::selection([0]))
                .with_answer("team", AnswerValue::text("core")),
            ResponseRecord::new("b", "s")
                .with_answer("hours", AnswerValue::number(4))
                .with_answer("tools", AnswerValue::selection([0]))
                .with_answer("team", AnswerValue::text("core")),
            ResponseRecord::new("c", "s")
                .with_answer("hours", AnswerValue::number(36))
                .with_answer("tools", AnswerValue::selection([2]))
                .with_answer("team", AnswerValue::text("infra")),
            ResponseRecord::new("d", "s")
                .with_answer("hours", AnswerValue::number(38))
                .with_answer("tools", AnswerValue::selection([2]))
                .with_answer("team", AnswerValue::text("infra")),
        ]
    }

    fn input<'a>(
        records: &'a [ResponseRecord],
        schema: &'a Schema,
        matrix: &'a DistanceMatrix,
        metric: &'a ResponseDistance,
    ) -> AnalysisInput<'a> {
        AnalysisInput {
            records,
            schema,
            matrix,
            metric,
        }
    }

    #[test]
    fn separates_two_tight_pairs() {
        let schema = schema();
        let records = records();
        let metric = ResponseDistance::new();
        let matrix = DistanceMatrix::from_records(&records, &schema, &metric).unwrap();
        let input = input(&records, &schema, &matrix, &metric);

        for seed in 0..10u64 {
            let model = KMeans::new(Initializer::Random).with_seed(seed);
            let partition = model.partition(&input, 2).unwrap();
            let a = partition.assignments();
            assert_eq!(a[0], a[1], "seed {seed}");
            assert_eq!(a[2], a[3], "seed {seed}");
            assert_ne!(a[0], a[2], "seed {seed}");
        }
    }

    #[test]
    fn optimized_variant_matches_plain_kmeans() {
        let schema = schema();
        let records = records();
        let metric = ResponseDistance::new();
        let matrix = DistanceMatrix::from_records(&records, &schema, &metric).unwrap();
        let input = input(&records, &schema, &matrix, &metric);

        for seed in 0..10u64 {
            let plain = KMeans::new(Initializer::KmeansPlusPlus)
                .with_seed(seed)
                .partition(&input, 2)
                .unwrap();
            let optimized = KMeansOptimized::new(Initializer::KmeansPlusPlus)
                .with_seed(seed)
                .partition(&input, 2)
                .unwrap();
            assert_eq!(plain.assignments(), optimized.assignments(), "seed {seed}");
        }
    }

    #[test]
    fn rejects_invalid_k() {
        let schema = schema();
        let records = records();
        let metric = ResponseDistance::new();
        let matrix = DistanceMatrix::from_records(&records, &schema, &metric).unwrap();
        let input = input(&records, &schema, &matrix, &metric);

        let model = KMeans::new(Initializer::Random).with_seed(0);
        assert!(model.partition(&input, 0).is_err());
        assert!(model.partition(&input, 5).is_err());
    }

    #[test]
    fn all_clusters_nonempty_even_with_identical_records() {
        let schema = schema();
        let records: Vec<ResponseRecord> = (0..4)
            .map(|i| {
                ResponseRecord::new(format!("r{i}"), "s")
                    .with_answer("hours", AnswerValue::number(10))
            })
            .collect();
        let metric = ResponseDistance::new();
        let matrix = DistanceMatrix::from_records(&records, &schema, &metric).unwrap();
        let input = input(&records, &schema, &matrix, &metric);

        for k in 1..=4 {
            let partition = KMeans::new(Initializer::Random)
                .with_seed(3)
                .partition(&input, k)
                .unwrap();
            assert_eq!(partition.k(), k);
            for cluster in partition.clusters() {
                assert!(!cluster.members.is_empty(), "k={k}");
            }
        }
    }

    #[test]
    fn centroid_aggregates_are_type_appropriate() {
        let schema = schema();
        let records = records();
        let metric = ResponseDistance::new();
        let matrix = DistanceMatrix::from_records(&records, &schema, &metric).unwrap();
        let input = input(&records, &schema, &matrix, &metric);

        let centroid = synthesize_centroid(&input, &[0, 1]);
        assert_eq!(centroid.get("hours"), Some(&AnswerValue::number(3)));
        assert_eq!(centroid.get("tools"), Some(&AnswerValue::selection([0])));
        assert_eq!(centroid.get("team"), Some(&AnswerValue::text("core")));
    }
}
