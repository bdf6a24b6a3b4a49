use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{AnswerValue, Assessment, Submission},
    models::dto::response::{AttemptView, QuestionView, SubmissionResult},
    repositories::{AssessmentRepository, SubmissionRepository},
    services::grading_service::GradingService,
};

/// Countdown marker shown once no time remains.
pub const TIME_UP: &str = "Time is up";

const TICK_INTERVAL: StdDuration = StdDuration::from_secs(1);

const NOT_AVAILABLE_MSG: &str = "This assessment is not available";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttemptPhase {
    /// Countdown running, answers being filled.
    Ready,
    /// A manual submission is being graded and persisted.
    Submitting,
    /// The countdown hit zero and a forced submission is being persisted.
    Expired,
    /// A submission was persisted; the attempt is over.
    Completed,
    /// The assessment was missing, not active or past its deadline at load.
    Unavailable,
}

/// Who is taking the attempt. Passed in explicitly so the machine never reads
/// ambient signed-in-user state.
#[derive(Clone, Debug)]
pub struct AttemptContext {
    pub user_id: String,
    pub display_name: String,
}

#[derive(Clone, Debug)]
struct AnswerSlot {
    question_id: String,
    value: Option<AnswerValue>,
}

/// One student's in-progress attempt. Nothing here is persisted until a
/// submission completes; abandoning the session discards it all.
pub struct AttemptSession {
    id: String,
    assessment: Assessment,
    context: AttemptContext,
    slots: Vec<AnswerSlot>,
    phase: AttemptPhase,
    outcome: Option<SubmissionResult>,
}

impl AttemptSession {
    /// Build the session from a fetched assessment: one empty answer slot per
    /// question and a running countdown when takeable, terminal `Unavailable`
    /// otherwise.
    pub fn open(assessment: Assessment, context: AttemptContext, now: DateTime<Utc>) -> Self {
        let (phase, slots) = if assessment.is_takeable(now) {
            let slots = assessment
                .questions
                .iter()
                .map(|q| AnswerSlot {
                    question_id: q.id.clone(),
                    value: None,
                })
                .collect();
            (AttemptPhase::Ready, slots)
        } else {
            (AttemptPhase::Unavailable, Vec::new())
        };

        AttemptSession {
            id: Uuid::new_v4().to_string(),
            assessment,
            context,
            slots,
            phase,
            outcome: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn phase(&self) -> AttemptPhase {
        self.phase
    }

    pub fn assessment(&self) -> &Assessment {
        &self.assessment
    }

    pub fn outcome(&self) -> Option<&SubmissionResult> {
        self.outcome.as_ref()
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        self.assessment.deadline - now
    }

    /// Remaining time for display, recomputed every tick.
    pub fn countdown(&self, now: DateTime<Utc>) -> String {
        format_remaining(self.remaining(now))
    }

    /// Fill one answer slot. Only allowed while the attempt is open.
    pub fn answer(&mut self, question_id: &str, value: AnswerValue) -> AppResult<()> {
        if self.phase != AttemptPhase::Ready {
            return Err(AppError::NotAvailable(
                "This attempt can no longer be modified".to_string(),
            ));
        }
        let slot = self
            .slots
            .iter_mut()
            .find(|slot| slot.question_id == question_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("No question '{}' in this attempt", question_id))
            })?;
        slot.value = Some(value);
        Ok(())
    }

    pub fn all_answered(&self) -> bool {
        self.slots.iter().all(|slot| {
            slot.value
                .as_ref()
                .map(|value| !value.coerce_to_string().trim().is_empty())
                .unwrap_or(false)
        })
    }

    /// One entry per question; unanswered slots submit as the empty string,
    /// which grades as non-matching.
    fn answers_map(&self) -> std::collections::HashMap<String, AnswerValue> {
        self.slots
            .iter()
            .map(|slot| {
                (
                    slot.question_id.clone(),
                    slot.value
                        .clone()
                        .unwrap_or_else(|| AnswerValue::Text(String::new())),
                )
            })
            .collect()
    }

    fn build_submission(&self) -> Submission {
        let answers = self.answers_map();
        let outcome = GradingService::grade(&self.assessment, &answers);
        Submission::completed(
            self.assessment.id.as_deref().unwrap_or_default(),
            &self.context.user_id,
            &self.context.display_name,
            answers,
            outcome.obtained_score,
        )
    }

    /// Manual submission: every question is mandatory. Moves to `Submitting`
    /// and hands back the graded submission for persistence.
    pub fn begin_submit(&mut self) -> AppResult<Submission> {
        match self.phase {
            AttemptPhase::Ready | AttemptPhase::Submitting => {}
            _ => {
                return Err(AppError::NotAvailable(
                    "This attempt has already finished".to_string(),
                ))
            }
        }
        if !self.all_answered() {
            return Err(AppError::ValidationError(
                "Please answer every question before submitting".to_string(),
            ));
        }
        self.phase = AttemptPhase::Submitting;
        Ok(self.build_submission())
    }

    /// Forced submission at countdown expiry: grades whatever is filled,
    /// bypassing the all-answered check. Returns `None` unless the attempt is
    /// still open, so a duplicate trigger is a no-op.
    pub fn begin_force_submit(&mut self) -> Option<Submission> {
        if self.phase != AttemptPhase::Ready {
            return None;
        }
        self.phase = AttemptPhase::Expired;
        Some(self.build_submission())
    }

    /// A submission was persisted; the attempt is over.
    pub fn complete(&mut self, outcome: SubmissionResult) {
        self.phase = AttemptPhase::Completed;
        self.outcome = Some(outcome);
    }

    /// Persisting failed: keep the answers in memory and allow a retry. The
    /// countdown, if it already fired, is not restarted.
    pub fn persist_failed(&mut self) {
        if matches!(self.phase, AttemptPhase::Submitting | AttemptPhase::Expired) {
            self.phase = AttemptPhase::Ready;
        }
    }
}

/// Break the remaining duration into whole hours, minutes and seconds (hours
/// fold within a day, matching the authoring UI's countdown).
pub fn format_remaining(remaining: Duration) -> String {
    if remaining <= Duration::zero() {
        return TIME_UP.to_string();
    }
    let total_seconds = remaining.num_seconds();
    let hours = (total_seconds % 86_400) / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let seconds = total_seconds % 60;
    format!("{}h {}m {}s", hours, minutes, seconds)
}

/// Snapshot of an open attempt for polling clients.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptStatus {
    pub attempt_id: String,
    pub phase: AttemptPhase,
    pub time_remaining: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<SubmissionResult>,
}

struct ActiveAttempt {
    session: Arc<Mutex<AttemptSession>>,
    countdown: JoinHandle<()>,
}

/// Owns every open attempt and its countdown task. Manual and forced
/// submission for one attempt serialize on the session mutex, so exactly one
/// of them completes the attempt.
pub struct AttemptService {
    assessments: Arc<dyn AssessmentRepository>,
    submissions: Arc<dyn SubmissionRepository>,
    attempts: DashMap<String, ActiveAttempt>,
}

impl AttemptService {
    pub fn new(
        assessments: Arc<dyn AssessmentRepository>,
        submissions: Arc<dyn SubmissionRepository>,
    ) -> Self {
        Self {
            assessments,
            submissions,
            attempts: DashMap::new(),
        }
    }

    /// Load the assessment and open an attempt on it. Availability failures
    /// (missing, not active, past deadline) terminate the attempt before it
    /// starts.
    pub async fn start(
        &self,
        assessment_id: &str,
        context: AttemptContext,
    ) -> AppResult<AttemptView> {
        let assessment = self
            .assessments
            .find_by_id(assessment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(NOT_AVAILABLE_MSG.to_string()))?;

        let now = Utc::now();
        let session = AttemptSession::open(assessment, context, now);
        if session.phase() == AttemptPhase::Unavailable {
            return Err(AppError::NotAvailable(NOT_AVAILABLE_MSG.to_string()));
        }

        let view = AttemptView {
            attempt_id: session.id().to_string(),
            assessment_id: session.assessment().id.clone().unwrap_or_default(),
            title: session.assessment().title.clone(),
            description: session.assessment().description.clone(),
            questions: session
                .assessment()
                .questions
                .iter()
                .map(QuestionView::from)
                .collect(),
            time_remaining: session.countdown(now),
        };

        let attempt_id = session.id().to_string();
        let session = Arc::new(Mutex::new(session));
        let countdown = self.spawn_countdown(Arc::clone(&session));
        self.attempts
            .insert(attempt_id, ActiveAttempt { session, countdown });

        Ok(view)
    }

    fn session(&self, attempt_id: &str) -> AppResult<Arc<Mutex<AttemptSession>>> {
        self.attempts
            .get(attempt_id)
            .map(|entry| Arc::clone(&entry.session))
            .ok_or_else(|| AppError::NotFound(format!("No open attempt '{}'", attempt_id)))
    }

    /// Fill one answer slot of an open attempt.
    pub async fn answer(
        &self,
        attempt_id: &str,
        question_id: &str,
        value: AnswerValue,
    ) -> AppResult<()> {
        let session = self.session(attempt_id)?;
        let mut session = session.lock().await;
        session.answer(question_id, value)
    }

    /// Phase, countdown and (after completion) the result.
    pub async fn status(&self, attempt_id: &str) -> AppResult<AttemptStatus> {
        let session = self.session(attempt_id)?;
        let session = session.lock().await;
        Ok(AttemptStatus {
            attempt_id: session.id().to_string(),
            phase: session.phase(),
            time_remaining: session.countdown(Utc::now()),
            outcome: session.outcome().cloned(),
        })
    }

    /// Manual submission. On success the countdown is canceled and the
    /// attempt leaves the registry; a persistence failure keeps the session
    /// (and its answers) in memory for retry. Submitting an attempt the
    /// countdown already completed returns the stored result unchanged.
    pub async fn submit(&self, attempt_id: &str) -> AppResult<SubmissionResult> {
        let session = self.session(attempt_id)?;
        let mut session = session.lock().await;

        if session.phase() == AttemptPhase::Completed {
            // Forced submission won the race; observing the terminal state is
            // the required no-op.
            let outcome = session
                .outcome()
                .cloned()
                .ok_or_else(|| AppError::InternalError("Completed attempt lost its result".to_string()))?;
            return Ok(outcome);
        }

        let submission = session.begin_submit()?;
        match self.submissions.create(submission).await {
            Ok(persisted) => {
                let outcome = SubmissionResult {
                    submission_id: persisted.id.clone().unwrap_or_default(),
                    obtained_score: persisted.obtained_score,
                    max_score: session.assessment().max_score,
                };
                session.complete(outcome.clone());
                drop(session);
                if let Some((_, active)) = self.attempts.remove(attempt_id) {
                    active.countdown.abort();
                }
                Ok(outcome)
            }
            Err(err) => {
                log::error!("submission for attempt {} failed: {}", attempt_id, err);
                session.persist_failed();
                Err(err)
            }
        }
    }

    /// Abandon an open attempt: cancel the countdown and discard every
    /// in-memory answer. Nothing is persisted.
    pub async fn abandon(&self, attempt_id: &str) -> AppResult<()> {
        let (_, active) = self.attempts.remove(attempt_id).ok_or_else(|| {
            AppError::NotFound(format!("No open attempt '{}'", attempt_id))
        })?;
        active.countdown.abort();
        Ok(())
    }

    /// Re-evaluate the remaining time once a second; at zero, fire exactly one
    /// forced submission. The loop exits on any terminal phase it observes, so
    /// a canceled-too-late timer can never submit twice.
    fn spawn_countdown(&self, session: Arc<Mutex<AttemptSession>>) -> JoinHandle<()> {
        let submissions = Arc::clone(&self.submissions);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(TICK_INTERVAL);
            loop {
                ticker.tick().await;
                let mut session = session.lock().await;
                if session.phase() != AttemptPhase::Ready {
                    break;
                }
                if session.remaining(Utc::now()) > Duration::zero() {
                    continue;
                }

                let Some(submission) = session.begin_force_submit() else {
                    break;
                };
                match submissions.create(submission).await {
                    Ok(persisted) => {
                        let outcome = SubmissionResult {
                            submission_id: persisted.id.clone().unwrap_or_default(),
                            obtained_score: persisted.obtained_score,
                            max_score: session.assessment().max_score,
                        };
                        log::info!(
                            "attempt {} force-submitted at deadline with score {}",
                            session.id(),
                            outcome.obtained_score
                        );
                        session.complete(outcome);
                    }
                    Err(err) => {
                        // Answers stay in memory; the student can retry
                        // manually. The countdown is not restarted.
                        log::error!(
                            "forced submission for attempt {} failed: {}",
                            session.id(),
                            err
                        );
                        session.persist_failed();
                    }
                }
                break;
            }
        })
    }
}
