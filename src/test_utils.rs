use std::collections::HashMap;

use chrono::{Duration, Utc};

use crate::models::domain::question::{Question, QuestionKind};
use crate::models::domain::{Assessment, AssessmentStatus, Submission, User};

pub mod fixtures {
    use super::*;

    /// Creates a standard test user
    pub fn test_user() -> User {
        User::test_user("Ana Torres", "ana@example.com")
    }

    /// A short-answer question with a known answer key.
    pub fn short_answer_question(id: &str, answer: &str, weight: f64) -> Question {
        let mut question = Question::new(
            "Answer with the expected value",
            QuestionKind::ShortAnswer,
            None,
            answer.into(),
            weight,
        );
        question.id = id.to_string();
        question
    }

    /// An active two-question assessment worth ten points, one hour from now.
    pub fn active_assessment() -> Assessment {
        let mut assessment = Assessment::new(
            "Fixture assessment",
            "Two questions worth five points each",
            "Mathematics",
            Utc::now() + Duration::hours(1),
            "teacher-1",
            vec![
                short_answer_question("q1", "A", 5.0),
                short_answer_question("q2", "4", 5.0),
            ],
        );
        assessment.id = Some("assessment-1".to_string());
        assessment.status = AssessmentStatus::Active;
        assessment
    }

    /// A completed submission with the given score against `active_assessment`.
    pub fn completed_submission(user_id: &str, score: f64) -> Submission {
        let mut submission = Submission::completed(
            "assessment-1",
            user_id,
            &format!("{}@example.com", user_id),
            HashMap::new(),
            score,
        );
        submission.id = Some(format!("submission-{}", user_id));
        submission
    }
}
