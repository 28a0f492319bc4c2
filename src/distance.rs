//! Mixed-type response dissimilarity and the pairwise distance matrix.
//!
//! # The Metric
//!
//! Two records are compared question by question against a shared
//! [`Schema`](crate::response::Schema); the overall distance is the
//! arithmetic mean of the per-question partial distances, each in
//! \[0, 1\]:
//!
//! - **Numeric**: `|v1 - v2| / (max - min)`, 0 on a degenerate range.
//! - **Choice** (unordered): Jaccard distance between the selected-option
//!   sets, `1 - |A ∩ B| / |A ∪ B|`; 0 when both selections are empty.
//! - **Choice** (ordered scale): a blend of Jaccard distance and how far
//!   apart the selections sit on the scale,
//!   `w · jaccard + (1 - w) · |mean_pos(A) - mean_pos(B)| / (total - 1)`,
//!   so adjacent Likert picks score closer than opposite ends.
//! - **FreeText**: 0 on equal text, 1 otherwise. Free text carries no
//!   intrinsic metric; a binary comparison is the honest floor.
//!
//! A question unanswered on either side is *excluded* from the mean (the
//! denominator shrinks), so optional questions never read as maximal
//! disagreement. If two records share no comparable question the distance
//! is undefined and the computation fails with
//! [`Error::NoComparableQuestions`].
//!
//! The metric is symmetric and `distance(a, a) == 0` for every record.

use crate::error::{Error, Result};
use crate::response::{AnswerSet, AnswerValue, QuestionKind, ResponseRecord, Schema};
use serde::{Deserialize, Serialize};

/// Schema-aware dissimilarity between two response records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseDistance {
    /// Weight of the Jaccard term for ordered choice questions; the
    /// remainder weighs the scale-position term.
    order_weight: f32,
}

impl ResponseDistance {
    /// Create a metric with the default ordered-choice weighting.
    pub fn new() -> Self {
        Self { order_weight: 0.5 }
    }

    /// Set the Jaccard weight used for ordered choice questions.
    ///
    /// Clamped to \[0, 1\]. `1.0` ignores scale positions entirely.
    pub fn with_order_weight(mut self, weight: f32) -> Self {
        self.order_weight = weight.clamp(0.0, 1.0);
        self
    }

    /// Distance between two records over `schema`.
    ///
    /// Fails with [`Error::NoComparableQuestions`] when no question is
    /// answered by both sides.
    pub fn distance(
        &self,
        a: &ResponseRecord,
        b: &ResponseRecord,
        schema: &Schema,
    ) -> Result<f32> {
        self.between(a.answers(), b.answers(), schema)
            .ok_or_else(|| Error::NoComparableQuestions {
                a: a.respondent().to_string(),
                b: b.respondent().to_string(),
            })
    }

    /// Distance between two answer sets; `None` when no question is
    /// comparable. Also used against synthetic centroids, which have no
    /// respondent identity to report.
    pub(crate) fn between(&self, a: &AnswerSet, b: &AnswerSet, schema: &Schema) -> Option<f32> {
        let mut total = 0.0f32;
        let mut compared = 0usize;

        for question in schema.questions() {
            let (Some(av), Some(bv)) = (a.get(&question.id), b.get(&question.id)) else {
                continue;
            };
            if let Some(partial) = self.partial(&question.kind, av, bv) {
                total += partial;
                compared += 1;
            }
        }

        (compared > 0).then(|| total / compared as f32)
    }

    /// Per-question partial distance in \[0, 1\]; `None` when either side
    /// is unanswered or does not match the schema kind.
    fn partial(&self, kind: &QuestionKind, a: &AnswerValue, b: &AnswerValue) -> Option<f32> {
        match (kind, a, b) {
            (QuestionKind::FreeText, AnswerValue::FreeText(ta), AnswerValue::FreeText(tb)) => {
                Some(if ta == tb { 0.0 } else { 1.0 })
            }
            (
                QuestionKind::Numeric { min, max },
                AnswerValue::Numeric(Some(va)),
                AnswerValue::Numeric(Some(vb)),
            ) => {
                let range = max.saturating_sub(*min);
                if range <= 0 {
                    Some(0.0)
                } else {
                    Some(((va.abs_diff(*vb)) as f32 / range as f32).clamp(0.0, 1.0))
                }
            }
            (
                QuestionKind::Choice {
                    total_options,
                    ordered,
                },
                AnswerValue::Choice(sa),
                AnswerValue::Choice(sb),
            ) => {
                let jaccard = jaccard_distance(sa, sb);
                if !ordered || sa.is_empty() || sb.is_empty() || *total_options <= 1 {
                    return Some(jaccard);
                }
                let scale = (*total_options - 1) as f32;
                let shift = (mean_position(sa) - mean_position(sb)).abs() / scale;
                Some(self.order_weight * jaccard + (1.0 - self.order_weight) * shift)
            }
            // Unanswered or schema-mismatched on either side: not comparable.
            _ => None,
        }
    }
}

impl Default for ResponseDistance {
    fn default() -> Self {
        Self::new()
    }
}

fn jaccard_distance(
    a: &std::collections::BTreeSet<usize>,
    b: &std::collections::BTreeSet<usize>,
) -> f32 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    1.0 - intersection as f32 / union as f32
}

fn mean_position(selected: &std::collections::BTreeSet<usize>) -> f32 {
    debug_assert!(!selected.is_empty());
    selected.iter().sum::<usize>() as f32 / selected.len() as f32
}

/// Symmetric pairwise distance matrix over one batch of records.
///
/// Built once per analysis run and read-only afterwards. Stored as a flat
/// row-major `n * n` buffer; the diagonal is zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceMatrix {
    n: usize,
    values: Vec<f32>,
}

impl DistanceMatrix {
    /// Compute the full pairwise matrix for `records` over `schema`.
    pub fn from_records(
        records: &[ResponseRecord],
        schema: &Schema,
        metric: &ResponseDistance,
    ) -> Result<Self> {
        let n = records.len();
        let mut values = vec![0.0f32; n * n];

        for i in 0..n {
            for j in (i + 1)..n {
                let d = metric.distance(&records[i], &records[j], schema)?;
                values[i * n + j] = d;
                values[j * n + i] = d;
            }
        }

        Ok(Self { n, values })
    }

    /// Build a matrix directly from row-major values (mainly for tests and
    /// projection of precomputed distances). Symmetry is the caller's
    /// responsibility.
    pub fn from_values(n: usize, values: Vec<f32>) -> Self {
        debug_assert_eq!(values.len(), n * n);
        Self { n, values }
    }

    /// Number of records the matrix covers.
    pub fn len(&self) -> usize {
        self.n
    }

    /// Whether the matrix covers no records.
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Distance between records `i` and `j`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.values[i * self.n + j]
    }

    /// Flat row-major view of all `n * n` distances.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Sub-matrix restricted to `indices`, in the given order.
    pub fn submatrix(&self, indices: &[usize]) -> DistanceMatrix {
        let m = indices.len();
        let mut values = vec![0.0f32; m * m];
        for (a, &i) in indices.iter().enumerate() {
            for (b, &j) in indices.iter().enumerate() {
                values[a * m + b] = self.get(i, j);
            }
        }
        DistanceMatrix { n: m, values }
    }

    /// Mean distance from `i` to every index in `others`, skipping `i`
    /// itself. Returns 0.0 when `others` holds no other index.
    pub(crate) fn mean_distance(&self, i: usize, others: &[usize]) -> f32 {
        let mut total = 0.0f32;
        let mut count = 0usize;
        for &j in others {
            if j != i {
                total += self.get(i, j);
                count += 1;
            }
        }
        if count == 0 {
            0.0
        } else {
            total / count as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::Question;
    use approx::assert_relative_eq;

    fn schema() -> Schema {
        Schema::new(vec![
            Question::numeric("age", 0, 100),
            Question::choice("tools", 4, false),
            Question::choice("satisfaction", 5, true),
            Question::free_text("feedback"),
        ])
    }

    fn record(id: &str) -> ResponseRecord {
        ResponseRecord::new(id, "survey-1")
    }

    #[test]
    fn identical_records_have_zero_distance() {
        let a = record("a")
            .with_answer("age", AnswerValue::number(30))
            .with_answer("tools", AnswerValue::selection([0, 1]))
            .with_answer("feedback", AnswerValue::text("ok"));

        let metric = ResponseDistance::new();
        let d = metric.distance(&a, &a.clone(), &schema()).unwrap();
        assert_relative_eq!(d, 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = record("a")
            .with_answer("age", AnswerValue::number(20))
            .with_answer("tools", AnswerValue::selection([0]));
        let b = record("b")
            .with_answer("age", AnswerValue::number(80))
            .with_answer("tools", AnswerValue::selection([1, 2]));

        let metric = ResponseDistance::new();
        let s = schema();
        assert_relative_eq!(
            metric.distance(&a, &b, &s).unwrap(),
            metric.distance(&b, &a, &s).unwrap()
        );
    }

    #[test]
    fn numeric_distance_is_range_normalized() {
        let a = record("a").with_answer("age", AnswerValue::number(0));
        let b = record("b").with_answer("age", AnswerValue::number(50));

        let metric = ResponseDistance::new();
        let d = metric.distance(&a, &b, &schema()).unwrap();
        assert_relative_eq!(d, 0.5);
    }

    #[test]
    fn degenerate_numeric_range_scores_zero() {
        let s = Schema::new(vec![Question::numeric("constant", 7, 7)]);
        let a = record("a").with_answer("constant", AnswerValue::number(7));
        let b = record("b").with_answer("constant", AnswerValue::number(7));

        let d = ResponseDistance::new().distance(&a, &b, &s).unwrap();
        assert_relative_eq!(d, 0.0);
    }

    #[test]
    fn choice_distance_is_jaccard() {
        let a = record("a").with_answer("tools", AnswerValue::selection([0, 1]));
        let b = record("b").with_answer("tools", AnswerValue::selection([1, 2]));

        // |A ∩ B| = 1, |A ∪ B| = 3.
        let d = ResponseDistance::new().distance(&a, &b, &schema()).unwrap();
        assert_relative_eq!(d, 1.0 - 1.0 / 3.0);
    }

    #[test]
    fn empty_selections_on_both_sides_score_zero() {
        let a = record("a").with_answer("tools", AnswerValue::selection([]));
        let b = record("b").with_answer("tools", AnswerValue::selection([]));

        let d = ResponseDistance::new().distance(&a, &b, &schema()).unwrap();
        assert_relative_eq!(d, 0.0);
    }

    #[test]
    fn ordered_choice_rewards_scale_proximity() {
        // Single picks on a 5-step scale: positions 1 vs 2 are closer than 0 vs 4.
        let near_a = record("a").with_answer("satisfaction", AnswerValue::selection([1]));
        let near_b = record("b").with_answer("satisfaction", AnswerValue::selection([2]));
        let far_a = record("c").with_answer("satisfaction", AnswerValue::selection([0]));
        let far_b = record("d").with_answer("satisfaction", AnswerValue::selection([4]));

        let metric = ResponseDistance::new();
        let s = schema();
        let near = metric.distance(&near_a, &near_b, &s).unwrap();
        let far = metric.distance(&far_a, &far_b, &s).unwrap();
        assert!(near < far, "adjacent picks ({near}) vs opposite ends ({far})");
    }

    #[test]
    fn unanswered_questions_shrink_the_denominator() {
        // Only "age" is answered by both; "tools" answered by one side only.
        let a = record("a")
            .with_answer("age", AnswerValue::number(0))
            .with_answer("tools", AnswerValue::selection([0]));
        let b = record("b").with_answer("age", AnswerValue::number(100));

        let d = ResponseDistance::new().distance(&a, &b, &schema()).unwrap();
        assert_relative_eq!(d, 1.0); // mean over one comparable question
    }

    #[test]
    fn skipped_numeric_counts_as_unanswered() {
        let a = record("a")
            .with_answer("age", AnswerValue::skipped())
            .with_answer("feedback", AnswerValue::text("x"));
        let b = record("b")
            .with_answer("age", AnswerValue::number(50))
            .with_answer("feedback", AnswerValue::text("x"));

        let d = ResponseDistance::new().distance(&a, &b, &schema()).unwrap();
        assert_relative_eq!(d, 0.0); // only "feedback" compares, and it matches
    }

    #[test]
    fn no_comparable_questions_is_an_error() {
        let a = record("a").with_answer("age", AnswerValue::number(10));
        let b = record("b").with_answer("feedback", AnswerValue::text("hi"));

        let err = ResponseDistance::new()
            .distance(&a, &b, &schema())
            .unwrap_err();
        assert!(matches!(err, Error::NoComparableQuestions { .. }));
    }

    #[test]
    fn matrix_is_symmetric_with_zero_diagonal() {
        let s = schema();
        let records = vec![
            record("a").with_answer("age", AnswerValue::number(10)),
            record("b").with_answer("age", AnswerValue::number(60)),
            record("c").with_answer("age", AnswerValue::number(90)),
        ];

        let matrix =
            DistanceMatrix::from_records(&records, &s, &ResponseDistance::new()).unwrap();
        assert_eq!(matrix.len(), 3);
        for i in 0..3 {
            assert_relative_eq!(matrix.get(i, i), 0.0);
            for j in 0..3 {
                assert_relative_eq!(matrix.get(i, j), matrix.get(j, i));
            }
        }
    }

    #[test]
    fn submatrix_preserves_pairwise_distances() {
        let s = schema();
        let records = vec![
            record("a").with_answer("age", AnswerValue::number(0)),
            record("b").with_answer("age", AnswerValue::number(50)),
            record("c").with_answer("age", AnswerValue::number(100)),
        ];

        let matrix =
            DistanceMatrix::from_records(&records, &s, &ResponseDistance::new()).unwrap();
        let sub = matrix.submatrix(&[0, 2]);
        assert_eq!(sub.len(), 2);
        assert_relative_eq!(sub.get(0, 1), matrix.get(0, 2));
    }
}
