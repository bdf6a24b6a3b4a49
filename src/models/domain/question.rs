use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Points assigned to a freshly added question.
pub const DEFAULT_WEIGHT: f64 = 1.0;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Question {
    pub id: String, // Assigned at authoring time, stable across edits
    pub text: String,
    pub kind: QuestionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>, // Only for multiple-choice
    pub correct_answer: AnswerValue,
    pub weight: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    MultipleChoice,
    OpenEnded,
    TrueFalse,
    ShortAnswer,
}

/// A canonical or submitted answer: the wire format allows either a string or
/// a number, and grading coerces both to text.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    Number(f64),
}

impl AnswerValue {
    /// Coerce to the textual form used for comparison. Whole numbers render
    /// without a trailing fraction, so `4` and `"4"` compare equal.
    pub fn coerce_to_string(&self) -> String {
        match self {
            AnswerValue::Text(s) => s.clone(),
            AnswerValue::Number(n) => n.to_string(),
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        AnswerValue::Text(value.to_string())
    }
}

impl Question {
    pub fn new(
        text: &str,
        kind: QuestionKind,
        options: Option<Vec<String>>,
        correct_answer: AnswerValue,
        weight: f64,
    ) -> Self {
        Question {
            id: Uuid::new_v4().to_string(),
            text: text.to_string(),
            kind,
            options,
            correct_answer,
            weight,
        }
    }

    /// Parse the authoring form's newline-delimited option block into the
    /// ordered option list: one option per non-blank line, trimmed.
    pub fn parse_options(block: &str) -> Vec<String> {
        block
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }
}
