use std::sync::Arc;

use serde::Serialize;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{Assessment, Submission},
    repositories::SubmissionRepository,
};

/// Fraction of `max_score` needed to pass.
pub const PASS_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentStatistics {
    pub total_responses: usize,
    pub mean_score: f64,
    pub highest_score: f64,
    pub lowest_score: f64,
    pub pass_count: usize,
    pub fail_count: usize,
    pub pass_rate: f64, // Percentage of total
    pub score_distribution: Vec<ScoreBucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBucket {
    pub range: String,
    pub count: usize,
}

pub struct StatisticsService {
    submissions: Arc<dyn SubmissionRepository>,
}

impl StatisticsService {
    pub fn new(submissions: Arc<dyn SubmissionRepository>) -> Self {
        Self { submissions }
    }

    /// Fetch an assessment's submissions and aggregate them. `None` when no
    /// completed submission exists yet.
    pub async fn for_assessment(
        &self,
        assessment: &Assessment,
    ) -> AppResult<Option<AssessmentStatistics>> {
        let id = assessment
            .id
            .as_deref()
            .ok_or_else(|| AppError::NotFound("Assessment has not been created".to_string()))?;
        let submissions = self.submissions.list_by_assessment(id).await?;
        Ok(Self::compute(assessment, &submissions))
    }

    /// Pure aggregation over one assessment's submissions. Only completed
    /// submissions count; an empty completed set yields `None`, never a
    /// zero-filled report.
    pub fn compute(
        assessment: &Assessment,
        submissions: &[Submission],
    ) -> Option<AssessmentStatistics> {
        let scores: Vec<f64> = submissions
            .iter()
            .filter(|s| s.is_completed())
            .map(|s| s.obtained_score)
            .collect();

        if scores.is_empty() {
            return None;
        }

        let total_responses = scores.len();
        let mean_score = scores.iter().sum::<f64>() / total_responses as f64;
        let highest_score = scores.iter().copied().fold(f64::MIN, f64::max);
        let lowest_score = scores.iter().copied().fold(f64::MAX, f64::min);

        let passing_score = assessment.max_score * PASS_THRESHOLD;
        let pass_count = scores.iter().filter(|&&s| s >= passing_score).count();
        let fail_count = total_responses - pass_count;
        let pass_rate = (pass_count as f64 / total_responses as f64) * 100.0;

        Some(AssessmentStatistics {
            total_responses,
            mean_score,
            highest_score,
            lowest_score,
            pass_count,
            fail_count,
            pass_rate,
            score_distribution: score_distribution(assessment.max_score, &scores),
        })
    }
}

/// Four buckets over `[0, max_score]` with cut points at 25/50/75 %. Labels
/// truncate the cut points for display; counting compares against the exact
/// untruncated values. The top bucket is closed so the maximum score lands in
/// it.
fn score_distribution(max_score: f64, scores: &[f64]) -> Vec<ScoreBucket> {
    let q1 = max_score * 0.25;
    let q2 = max_score * 0.5;
    let q3 = max_score * 0.75;

    vec![
        ScoreBucket {
            range: format!("0-{}", q1.trunc()),
            count: scores.iter().filter(|&&s| s < q1).count(),
        },
        ScoreBucket {
            range: format!("{}-{}", q1.trunc(), q2.trunc()),
            count: scores.iter().filter(|&&s| s >= q1 && s < q2).count(),
        },
        ScoreBucket {
            range: format!("{}-{}", q2.trunc(), q3.trunc()),
            count: scores.iter().filter(|&&s| s >= q2 && s < q3).count(),
        },
        ScoreBucket {
            range: format!("{}-{}", q3.trunc(), max_score),
            count: scores.iter().filter(|&&s| s >= q3).count(),
        },
    ]
}
