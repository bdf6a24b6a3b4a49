use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};
use crate::models::domain::question::Question;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Assessment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>, // Absent before creation, assigned by the persistence layer
    pub title: String,
    pub description: String,
    pub category: String,
    pub status: AssessmentStatus,
    pub created_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub max_score: f64, // Always the sum of question weights
    pub owner_id: String,
    pub questions: Vec<Question>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Copy)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentStatus {
    Draft,
    Active,
    Closed,
}

impl AssessmentStatus {
    /// Wire name, identical to the serde representation and the value stored
    /// in the document store.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentStatus::Draft => "draft",
            AssessmentStatus::Active => "active",
            AssessmentStatus::Closed => "closed",
        }
    }
}

impl Assessment {
    pub fn new(
        title: &str,
        description: &str,
        category: &str,
        deadline: DateTime<Utc>,
        owner_id: &str,
        questions: Vec<Question>,
    ) -> Self {
        let mut assessment = Assessment {
            id: None,
            title: title.to_string(),
            description: description.to_string(),
            category: category.to_string(),
            status: AssessmentStatus::Draft,
            created_at: Utc::now(),
            deadline,
            max_score: 0.0,
            owner_id: owner_id.to_string(),
            questions,
        };
        assessment.recompute_max_score();
        assessment
    }

    /// Re-derive `max_score` from the live question list. Called after every
    /// mutation of the question set; the summed value is authoritative.
    pub fn recompute_max_score(&mut self) {
        self.max_score = self.questions.iter().map(|q| q.weight).sum();
    }

    /// Append a question, keeping `max_score` in sync.
    pub fn add_question(&mut self, question: Question) {
        self.questions.push(question);
        self.recompute_max_score();
    }

    /// Remove the question at `index`. Rejected when it would leave the
    /// assessment without any question.
    pub fn remove_question(&mut self, index: usize) -> AppResult<Question> {
        if self.questions.len() <= 1 {
            return Err(AppError::ValidationError(
                "An assessment must keep at least one question".to_string(),
            ));
        }
        if index >= self.questions.len() {
            return Err(AppError::NotFound(format!(
                "No question at position {}",
                index
            )));
        }
        let removed = self.questions.remove(index);
        self.recompute_max_score();
        Ok(removed)
    }

    /// Replace the whole question set (authoring form save), keeping
    /// `max_score` in sync.
    pub fn replace_questions(&mut self, questions: Vec<Question>) {
        self.questions = questions;
        self.recompute_max_score();
    }

    /// An assessment can be taken while it is active, its deadline lies in the
    /// future and it has at least one question.
    pub fn is_takeable(&self, now: DateTime<Utc>) -> bool {
        self.status == AssessmentStatus::Active
            && self.deadline > now
            && !self.questions.is_empty()
    }
}
