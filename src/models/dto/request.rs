use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::domain::assessment::AssessmentStatus;
use crate::models::domain::question::{self, AnswerValue, Question, QuestionKind};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub display_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// One question as authored in the assessment form. Options arrive as the
/// form's newline-delimited block and are parsed at save time.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[validate(schema(function = validate_question_input))]
pub struct QuestionInput {
    /// Present when editing an existing question; absent for a new one.
    pub id: Option<String>,

    #[validate(length(min = 5, message = "Question text must be at least 5 characters"))]
    pub text: String,

    pub kind: QuestionKind,

    #[serde(default)]
    pub options: Option<String>,

    pub correct_answer: AnswerValue,

    #[serde(default = "default_weight")]
    #[validate(range(min = 0.5, message = "Question weight must be at least 0.5"))]
    pub weight: f64,
}

fn default_weight() -> f64 {
    question::DEFAULT_WEIGHT
}

fn validate_question_input(input: &QuestionInput) -> Result<(), ValidationError> {
    if input.kind == QuestionKind::MultipleChoice {
        let has_options = input
            .options
            .as_deref()
            .map(|block| !Question::parse_options(block).is_empty())
            .unwrap_or(false);
        if !has_options {
            let mut error = ValidationError::new("options_required");
            error.message = Some("Multiple-choice questions need at least one option".into());
            return Err(error);
        }
    }
    if input.correct_answer.coerce_to_string().trim().is_empty() {
        let mut error = ValidationError::new("correct_answer_required");
        error.message = Some("A correct answer is required".into());
        return Err(error);
    }
    Ok(())
}

impl QuestionInput {
    /// Build the domain question: keep the authored id when editing, assign a
    /// fresh one otherwise; parse options only for multiple-choice.
    pub fn into_question(self) -> Question {
        let options = match self.kind {
            QuestionKind::MultipleChoice => self
                .options
                .as_deref()
                .map(Question::parse_options)
                .filter(|parsed| !parsed.is_empty()),
            _ => None,
        };
        let mut built = Question::new(
            &self.text,
            self.kind,
            options,
            self.correct_answer,
            self.weight,
        );
        if let Some(id) = self.id {
            built.id = id;
        }
        built
    }
}

/// Shared payload for creating and updating an assessment (the authoring form
/// submits the full document both times).
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SaveAssessmentRequest {
    #[validate(length(min = 3, message = "Title must be at least 3 characters"))]
    pub title: String,

    #[validate(length(min = 10, message = "Description must be at least 10 characters"))]
    pub description: String,

    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,

    pub deadline: DateTime<Utc>,

    #[serde(default = "default_status")]
    pub status: AssessmentStatus,

    /// The form's editable score field. Informational only; the stored value
    /// is always re-derived from the question weights.
    #[serde(default)]
    pub max_score: Option<f64>,

    #[validate(
        length(min = 1, message = "At least one question is required"),
        nested
    )]
    pub questions: Vec<QuestionInput>,
}

fn default_status() -> AssessmentStatus {
    AssessmentStatus::Draft
}

impl SaveAssessmentRequest {
    pub fn into_questions(self) -> Vec<Question> {
        self.questions
            .into_iter()
            .map(QuestionInput::into_question)
            .collect()
    }
}

/// Body for filling one answer slot of an open attempt.
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerInput {
    pub value: AnswerValue,
}

/// Query filters for the owner's assessment listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssessmentListQuery {
    pub search: Option<String>,
    pub status: Option<AssessmentStatus>,
    pub category: Option<String>,
}
