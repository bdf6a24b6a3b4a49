use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::domain::question::AnswerValue;

/// A student's attempt at an assessment. Persisted exactly once, as
/// `completed`; the score is an immutable historical record and is never
/// recomputed after submission.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Submission {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>, // Assigned by the persistence layer on creation
    pub assessment_id: String,
    pub user_id: String,
    pub user_display_name: String,
    pub answers: HashMap<String, AnswerValue>, // Keyed by question id
    pub obtained_score: f64,
    pub submitted_at: DateTime<Utc>,
    pub status: SubmissionStatus,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum SubmissionStatus {
    InProgress,
    Completed,
}

impl Submission {
    pub fn completed(
        assessment_id: &str,
        user_id: &str,
        user_display_name: &str,
        answers: HashMap<String, AnswerValue>,
        obtained_score: f64,
    ) -> Self {
        Submission {
            id: None,
            assessment_id: assessment_id.to_string(),
            user_id: user_id.to_string(),
            user_display_name: user_display_name.to_string(),
            answers,
            obtained_score,
            submitted_at: Utc::now(),
            status: SubmissionStatus::Completed,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == SubmissionStatus::Completed
    }
}
