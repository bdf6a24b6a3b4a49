use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::domain::assessment::{Assessment, AssessmentStatus};
use crate::models::domain::question::{Question, QuestionKind};

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub refresh_token: String,
    pub user_id: String,
    pub display_name: String,
    pub email: String,
}

/// A question as shown to a student taking the assessment: the answer key and
/// the weight stay server-side.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub id: String,
    pub text: String,
    pub kind: QuestionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl From<&Question> for QuestionView {
    fn from(question: &Question) -> Self {
        QuestionView {
            id: question.id.clone(),
            text: question.text.clone(),
            kind: question.kind,
            options: question.options.clone(),
        }
    }
}

/// An assessment card for the student-facing "available" listing.
#[derive(Debug, Clone, Serialize)]
pub struct AvailableAssessment {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub deadline: DateTime<Utc>,
    pub max_score: f64,
    pub question_count: usize,
    pub status: AssessmentStatus,
}

impl From<&Assessment> for AvailableAssessment {
    fn from(assessment: &Assessment) -> Self {
        AvailableAssessment {
            id: assessment.id.clone().unwrap_or_default(),
            title: assessment.title.clone(),
            description: assessment.description.clone(),
            category: assessment.category.clone(),
            deadline: assessment.deadline,
            max_score: assessment.max_score,
            question_count: assessment.questions.len(),
            status: assessment.status,
        }
    }
}

/// An open attempt as seen by the student: the answer form plus the countdown.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptView {
    pub attempt_id: String,
    pub assessment_id: String,
    pub title: String,
    pub description: String,
    pub questions: Vec<QuestionView>,
    pub time_remaining: String,
}

/// The outcome screen after a submission was persisted.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionResult {
    pub submission_id: String,
    pub obtained_score: f64,
    pub max_score: f64,
}
