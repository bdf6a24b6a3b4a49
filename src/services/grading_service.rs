use std::collections::HashMap;

use serde::Serialize;

use crate::models::domain::{AnswerValue, Assessment};

/// Grades one attempt against an assessment's answer key.
pub struct GradingService;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeOutcome {
    pub obtained_score: f64,
    pub per_question: Vec<QuestionResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionResult {
    pub question_id: String,
    pub correct: bool,
    pub points_awarded: f64,
}

impl GradingService {
    /// Pure grading function: walks the questions in assessment order, awards
    /// the full weight on an exact normalized match and zero otherwise. A
    /// missing answer is treated as the empty string. The obtained score is
    /// the sum of awarded weights, so it always lies in `[0, max_score]`, and
    /// identical inputs always produce identical output.
    pub fn grade(assessment: &Assessment, answers: &HashMap<String, AnswerValue>) -> GradeOutcome {
        let mut obtained_score = 0.0;
        let mut per_question = Vec::with_capacity(assessment.questions.len());

        for question in &assessment.questions {
            let submitted = answers
                .get(&question.id)
                .map(AnswerValue::coerce_to_string)
                .unwrap_or_default();

            let correct = normalize(&question.correct_answer.coerce_to_string())
                == normalize(&submitted);
            let points_awarded = if correct { question.weight } else { 0.0 };
            obtained_score += points_awarded;

            per_question.push(QuestionResult {
                question_id: question.id.clone(),
                correct,
                points_awarded,
            });
        }

        GradeOutcome {
            obtained_score,
            per_question,
        }
    }
}

/// Comparison is always case- and whitespace-insensitive string equality: no
/// partial credit, no numeric tolerance.
fn normalize(raw: &str) -> String {
    raw.to_lowercase().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::question::{Question, QuestionKind};
    use chrono::{Duration, Utc};

    fn two_question_assessment() -> Assessment {
        let mut q1 = Question::new(
            "Pick the letter A",
            QuestionKind::MultipleChoice,
            Some(vec!["A".to_string(), "B".to_string()]),
            "A".into(),
            5.0,
        );
        q1.id = "q1".to_string();
        let mut q2 = Question::new(
            "What is 2 + 2?",
            QuestionKind::ShortAnswer,
            None,
            AnswerValue::Number(4.0),
            5.0,
        );
        q2.id = "q2".to_string();

        Assessment::new(
            "Mixed drill",
            "Two questions worth five points each",
            "Mathematics",
            Utc::now() + Duration::hours(1),
            "teacher-1",
            vec![q1, q2],
        )
    }

    fn answers(pairs: &[(&str, AnswerValue)]) -> HashMap<String, AnswerValue> {
        pairs
            .iter()
            .map(|(id, value)| (id.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn full_marks_for_exact_matches_with_case_folding() {
        let assessment = two_question_assessment();
        let submitted = answers(&[("q1", "a".into()), ("q2", "4".into())]);

        let outcome = GradingService::grade(&assessment, &submitted);
        assert_eq!(outcome.obtained_score, 10.0);
        assert!(outcome.per_question.iter().all(|r| r.correct));
    }

    #[test]
    fn wrong_answer_earns_zero_for_that_question() {
        let assessment = two_question_assessment();
        let submitted = answers(&[("q1", "B".into()), ("q2", "4".into())]);

        let outcome = GradingService::grade(&assessment, &submitted);
        assert_eq!(outcome.obtained_score, 5.0);
        assert!(!outcome.per_question[0].correct);
        assert_eq!(outcome.per_question[0].points_awarded, 0.0);
        assert!(outcome.per_question[1].correct);
    }

    #[test]
    fn grading_is_whitespace_insensitive() {
        let assessment = two_question_assessment();

        let tidy = GradingService::grade(&assessment, &answers(&[("q1", "A".into())]));
        let messy = GradingService::grade(&assessment, &answers(&[("q1", "  a  ".into())]));

        assert_eq!(tidy.obtained_score, messy.obtained_score);
        assert_eq!(tidy.obtained_score, 5.0);
    }

    #[test]
    fn submitted_number_matches_textual_answer_key() {
        let assessment = two_question_assessment();
        let submitted = answers(&[("q2", AnswerValue::Number(4.0))]);

        let outcome = GradingService::grade(&assessment, &submitted);
        assert!(outcome.per_question[1].correct);
    }

    #[test]
    fn missing_answers_grade_as_incorrect() {
        let assessment = two_question_assessment();

        let outcome = GradingService::grade(&assessment, &HashMap::new());
        assert_eq!(outcome.obtained_score, 0.0);
        assert_eq!(outcome.per_question.len(), 2);
        assert!(outcome.per_question.iter().all(|r| !r.correct));
    }

    #[test]
    fn answers_for_unknown_questions_are_ignored() {
        let assessment = two_question_assessment();
        let submitted = answers(&[("q1", "A".into()), ("ghost", "A".into())]);

        let outcome = GradingService::grade(&assessment, &submitted);
        assert_eq!(outcome.obtained_score, 5.0);
        assert_eq!(outcome.per_question.len(), 2);
    }

    #[test]
    fn score_stays_within_bounds_and_is_deterministic() {
        let assessment = two_question_assessment();
        let submitted = answers(&[("q1", " A ".into()), ("q2", "five".into())]);

        let first = GradingService::grade(&assessment, &submitted);
        let second = GradingService::grade(&assessment, &submitted);

        assert_eq!(first, second);
        assert!(first.obtained_score >= 0.0);
        assert!(first.obtained_score <= assessment.max_score);
    }

    #[test]
    fn per_question_results_follow_assessment_order() {
        let assessment = two_question_assessment();
        let outcome = GradingService::grade(&assessment, &HashMap::new());

        assert_eq!(outcome.per_question[0].question_id, "q1");
        assert_eq!(outcome.per_question[1].question_id, "q2");
    }
}
