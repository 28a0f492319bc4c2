//! Survey data model: question schemas, typed answers, response records.
//!
//! A [`Schema`] describes the questions of one survey: their ids, semantic
//! types, and the type parameters the distance metric needs (numeric range,
//! option count, order sensitivity). A [`ResponseRecord`] is one respondent's
//! set of [`AnswerValue`]s against that schema.
//!
//! Records and schemas are supplied by the caller and never mutated by the
//! engine. A question missing from a record's answer map is *unanswered*,
//! which the distance metric treats differently from a maximally distant
//! answer (see [`crate::distance`]).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The semantic type of a survey question, with the parameters the
/// distance metric needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionKind {
    /// Free-form text. Carries no intrinsic metric.
    FreeText,

    /// Integer answer constrained to `min..=max`.
    Numeric {
        /// Smallest admissible value.
        min: i64,
        /// Largest admissible value.
        max: i64,
    },

    /// One or more selections out of a fixed option list.
    Choice {
        /// Number of options the question offers.
        total_options: usize,
        /// Whether the options form an ordered scale (e.g. "never" … "daily").
        ordered: bool,
    },
}

/// One question of a survey schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Question id, unique within the schema.
    pub id: String,
    /// Semantic type and its parameters.
    pub kind: QuestionKind,
}

impl Question {
    /// A free-text question.
    pub fn free_text(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: QuestionKind::FreeText,
        }
    }

    /// A numeric question with an inclusive `min..=max` range.
    pub fn numeric(id: impl Into<String>, min: i64, max: i64) -> Self {
        Self {
            id: id.into(),
            kind: QuestionKind::Numeric { min, max },
        }
    }

    /// A multiple-choice question over `total_options` options.
    pub fn choice(id: impl Into<String>, total_options: usize, ordered: bool) -> Self {
        Self {
            id: id.into(),
            kind: QuestionKind::Choice {
                total_options,
                ordered,
            },
        }
    }
}

/// Ordered question list of one survey.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    questions: Vec<Question>,
}

impl Schema {
    /// Build a schema from an ordered question list.
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    /// The questions, in schema order.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Number of questions.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether the schema has no questions.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// One respondent's answer to one question.
///
/// The variant must match the schema's [`QuestionKind`] for the question;
/// a mismatched or absent answer is treated as unanswered by the distance
/// metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerValue {
    /// Free-form text.
    FreeText(String),
    /// Numeric value; `None` means the respondent skipped the question.
    Numeric(Option<i64>),
    /// Selected option indices (`0..total_options`).
    Choice(BTreeSet<usize>),
}

impl AnswerValue {
    /// A free-text answer.
    pub fn text(text: impl Into<String>) -> Self {
        Self::FreeText(text.into())
    }

    /// A numeric answer.
    pub fn number(value: i64) -> Self {
        Self::Numeric(Some(value))
    }

    /// An explicitly skipped numeric answer.
    pub fn skipped() -> Self {
        Self::Numeric(None)
    }

    /// A choice answer selecting the given option indices.
    pub fn selection(options: impl IntoIterator<Item = usize>) -> Self {
        Self::Choice(options.into_iter().collect())
    }
}

/// Map from question id to answer, ordered by question id.
pub type AnswerSet = BTreeMap<String, AnswerValue>;

/// One respondent's full set of answers to one survey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseRecord {
    respondent: String,
    survey: String,
    answers: AnswerSet,
}

impl ResponseRecord {
    /// Create an empty record for `respondent` answering `survey`.
    pub fn new(respondent: impl Into<String>, survey: impl Into<String>) -> Self {
        Self {
            respondent: respondent.into(),
            survey: survey.into(),
            answers: BTreeMap::new(),
        }
    }

    /// Add or replace one answer.
    pub fn with_answer(mut self, question_id: impl Into<String>, value: AnswerValue) -> Self {
        self.answers.insert(question_id.into(), value);
        self
    }

    /// Respondent identity.
    pub fn respondent(&self) -> &str {
        &self.respondent
    }

    /// Survey this record answers (its provenance).
    pub fn survey(&self) -> &str {
        &self.survey
    }

    /// The answer to `question_id`, if any was given.
    pub fn answer(&self, question_id: &str) -> Option<&AnswerValue> {
        self.answers.get(question_id)
    }

    /// All answers, ordered by question id.
    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_builder_collects_answers() {
        let record = ResponseRecord::new("r1", "s1")
            .with_answer("age", AnswerValue::number(34))
            .with_answer("tools", AnswerValue::selection([0, 2]))
            .with_answer("feedback", AnswerValue::text("fine"));

        assert_eq!(record.respondent(), "r1");
        assert_eq!(record.survey(), "s1");
        assert_eq!(record.answer("age"), Some(&AnswerValue::Numeric(Some(34))));
        assert_eq!(record.answer("missing"), None);
        assert_eq!(record.answers().len(), 3);
    }

    #[test]
    fn question_constructors_carry_parameters() {
        let q = Question::numeric("age", 0, 120);
        assert_eq!(q.kind, QuestionKind::Numeric { min: 0, max: 120 });

        let q = Question::choice("satisfaction", 5, true);
        assert_eq!(
            q.kind,
            QuestionKind::Choice {
                total_options: 5,
                ordered: true
            }
        );
    }

    #[test]
    fn schema_serialization_roundtrip() {
        let schema = Schema::new(vec![
            Question::numeric("age", 0, 120),
            Question::choice("tools", 4, false),
            Question::free_text("feedback"),
        ]);

        let json = serde_json::to_string(&schema).unwrap();
        let restored: Schema = serde_json::from_str(&json).unwrap();
        assert_eq!(schema, restored);
    }
}
