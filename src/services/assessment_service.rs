use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use crate::{
    db::Subscription,
    errors::{AppError, AppResult},
    models::domain::{Assessment, AssessmentStatus},
    models::dto::request::{AssessmentListQuery, SaveAssessmentRequest},
    repositories::AssessmentRepository,
};

/// Authoring and listing operations over assessments.
pub struct AssessmentService {
    repository: Arc<dyn AssessmentRepository>,
}

impl AssessmentService {
    pub fn new(repository: Arc<dyn AssessmentRepository>) -> Self {
        Self { repository }
    }

    /// Validate and persist a new assessment. The stored `max_score` is the
    /// sum of the question weights; a figure supplied in the request is
    /// informational only and never trusted.
    pub async fn create(
        &self,
        request: SaveAssessmentRequest,
        owner_id: &str,
    ) -> AppResult<Assessment> {
        request.validate()?;

        let mut assessment = Assessment::new(
            &request.title,
            &request.description,
            &request.category,
            request.deadline,
            owner_id,
            Vec::new(),
        );
        assessment.status = request.status;
        assessment.replace_questions(request.into_questions());

        self.repository.create(assessment).await
    }

    pub async fn get(&self, id: &str) -> AppResult<Assessment> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Assessment '{}' not found", id)))
    }

    /// Fetch an assessment the caller must own.
    pub async fn get_owned(&self, id: &str, owner_id: &str) -> AppResult<Assessment> {
        let assessment = self.get(id).await?;
        if assessment.owner_id != owner_id {
            return Err(AppError::Unauthorized(
                "You can only manage your own assessments".to_string(),
            ));
        }
        Ok(assessment)
    }

    /// Replace an owned assessment with the submitted form. `max_score` is
    /// re-derived from the new question set.
    pub async fn update(
        &self,
        id: &str,
        request: SaveAssessmentRequest,
        owner_id: &str,
    ) -> AppResult<Assessment> {
        request.validate()?;

        let mut assessment = self.get_owned(id, owner_id).await?;
        assessment.title = request.title.clone();
        assessment.description = request.description.clone();
        assessment.category = request.category.clone();
        assessment.deadline = request.deadline;
        assessment.status = request.status;
        assessment.replace_questions(request.into_questions());

        self.repository.update(assessment).await
    }

    /// Delete an owned assessment. Submissions are historical records and are
    /// deliberately left in place.
    pub async fn delete(&self, id: &str, owner_id: &str) -> AppResult<()> {
        self.get_owned(id, owner_id).await?;
        self.repository.delete(id).await?;
        Ok(())
    }

    /// The owner's assessments, newest first, optionally narrowed by a search
    /// term, a status or a category.
    pub async fn list_by_owner(
        &self,
        owner_id: &str,
        query: &AssessmentListQuery,
    ) -> AppResult<Vec<Assessment>> {
        let mut assessments = self.repository.list_by_owner(owner_id).await?;

        if let Some(term) = query.search.as_deref().filter(|t| !t.trim().is_empty()) {
            assessments.retain(|a| matches_search(a, term));
        }
        if let Some(status) = query.status {
            assessments.retain(|a| a.status == status);
        }
        if let Some(category) = query.category.as_deref() {
            assessments.retain(|a| a.category == category);
        }

        Ok(assessments)
    }

    /// Live view of the owner's listing; the handle cancels it.
    pub async fn watch_by_owner(&self, owner_id: &str) -> AppResult<Subscription<Assessment>> {
        self.repository.watch_by_owner(owner_id).await
    }

    /// What students can take right now: active, with a deadline still in the
    /// future, from any author.
    pub async fn list_available(&self) -> AppResult<Vec<Assessment>> {
        let now = Utc::now();
        let mut assessments = self.repository.list_by_status(AssessmentStatus::Active).await?;
        assessments.retain(|a| a.is_takeable(now));
        Ok(assessments)
    }
}

/// Case-insensitive containment over title, category and description.
fn matches_search(assessment: &Assessment, term: &str) -> bool {
    let term = term.to_lowercase();
    assessment.title.to_lowercase().contains(&term)
        || assessment.category.to_lowercase().contains(&term)
        || assessment.description.to_lowercase().contains(&term)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::question::QuestionKind;
    use crate::models::dto::request::QuestionInput;
    use crate::repositories::assessment_repository::MockAssessmentRepository;
    use chrono::Duration;
    use uuid::Uuid;

    fn question_input(weight: f64) -> QuestionInput {
        QuestionInput {
            id: None,
            text: "What is the capital of France?".to_string(),
            kind: QuestionKind::ShortAnswer,
            options: None,
            correct_answer: "Paris".into(),
            weight,
        }
    }

    fn save_request(weights: &[f64]) -> SaveAssessmentRequest {
        SaveAssessmentRequest {
            title: "Geography".to_string(),
            description: "European capitals, first round".to_string(),
            category: "Geography".to_string(),
            deadline: Utc::now() + Duration::days(1),
            status: AssessmentStatus::Active,
            max_score: None,
            questions: weights.iter().copied().map(question_input).collect(),
        }
    }

    fn stored_assessment(owner_id: &str, category: &str) -> Assessment {
        let mut assessment = Assessment::new(
            "Algebra basics",
            "Linear equations and inequalities",
            category,
            Utc::now() + Duration::days(1),
            owner_id,
            vec![question_input(1.0).into_question()],
        );
        assessment.id = Some(Uuid::new_v4().to_string());
        assessment
    }

    fn service_with(mock: MockAssessmentRepository) -> AssessmentService {
        AssessmentService::new(Arc::new(mock))
    }

    #[actix_web::test]
    async fn create_derives_max_score_from_question_weights() {
        let mut mock = MockAssessmentRepository::new();
        mock.expect_create()
            .withf(|assessment| assessment.max_score == 7.5)
            .returning(|mut assessment| {
                assessment.id = Some("a-1".to_string());
                Ok(assessment)
            });

        let mut request = save_request(&[5.0, 2.5]);
        // A client-supplied figure must not override the derived sum.
        request.max_score = Some(99.0);

        let created = service_with(mock)
            .create(request, "teacher-1")
            .await
            .unwrap();
        assert_eq!(created.max_score, 7.5);
        assert_eq!(created.owner_id, "teacher-1");
        assert_eq!(created.id.as_deref(), Some("a-1"));
    }

    #[actix_web::test]
    async fn create_rejects_invalid_authoring_input() {
        let service = service_with(MockAssessmentRepository::new());

        let mut request = save_request(&[1.0]);
        request.title = "ab".to_string();
        assert!(matches!(
            service.create(request, "teacher-1").await,
            Err(AppError::ValidationError(_))
        ));

        let empty = SaveAssessmentRequest {
            questions: Vec::new(),
            ..save_request(&[1.0])
        };
        assert!(matches!(
            service.create(empty, "teacher-1").await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[actix_web::test]
    async fn update_rederives_max_score_and_keeps_ownership() {
        let existing = stored_assessment("teacher-1", "Mathematics");
        let id = existing.id.clone().unwrap();

        let mut mock = MockAssessmentRepository::new();
        let found = existing.clone();
        mock.expect_find_by_id()
            .returning(move |_| Ok(Some(found.clone())));
        mock.expect_update()
            .withf(|assessment| assessment.max_score == 3.0 && assessment.questions.len() == 2)
            .returning(Ok);

        let updated = service_with(mock)
            .update(&id, save_request(&[1.5, 1.5]), "teacher-1")
            .await
            .unwrap();
        assert_eq!(updated.max_score, 3.0);
    }

    #[actix_web::test]
    async fn update_by_a_non_owner_is_rejected() {
        let existing = stored_assessment("teacher-1", "Mathematics");
        let id = existing.id.clone().unwrap();

        let mut mock = MockAssessmentRepository::new();
        mock.expect_find_by_id()
            .returning(move |_| Ok(Some(existing.clone())));

        let result = service_with(mock)
            .update(&id, save_request(&[1.0]), "someone-else")
            .await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[actix_web::test]
    async fn delete_by_a_non_owner_is_rejected() {
        let existing = stored_assessment("teacher-1", "Mathematics");
        let id = existing.id.clone().unwrap();

        let mut mock = MockAssessmentRepository::new();
        mock.expect_find_by_id()
            .returning(move |_| Ok(Some(existing.clone())));

        let result = service_with(mock).delete(&id, "someone-else").await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[actix_web::test]
    async fn owner_listing_applies_search_and_category_filters() {
        let mut mock = MockAssessmentRepository::new();
        mock.expect_list_by_owner().returning(|_| {
            let mut algebra = stored_assessment("teacher-1", "Mathematics");
            algebra.title = "Algebra basics".to_string();
            let mut capitals = stored_assessment("teacher-1", "Geography");
            capitals.title = "European capitals".to_string();
            Ok(vec![algebra, capitals])
        });

        let service = service_with(mock);

        let by_term = service
            .list_by_owner(
                "teacher-1",
                &AssessmentListQuery {
                    search: Some("ALGEBRA".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(by_term.len(), 1);
        assert_eq!(by_term[0].title, "Algebra basics");

        let by_category = service
            .list_by_owner(
                "teacher-1",
                &AssessmentListQuery {
                    category: Some("Geography".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(by_category.len(), 1);
        assert_eq!(by_category[0].category, "Geography");
    }

    #[actix_web::test]
    async fn owner_listing_applies_status_filter() {
        let mut mock = MockAssessmentRepository::new();
        mock.expect_list_by_owner().returning(|_| {
            let draft = stored_assessment("teacher-1", "Mathematics");
            let mut active = stored_assessment("teacher-1", "Mathematics");
            active.status = AssessmentStatus::Active;
            Ok(vec![draft, active])
        });

        let listed = service_with(mock)
            .list_by_owner(
                "teacher-1",
                &AssessmentListQuery {
                    status: Some(AssessmentStatus::Active),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, AssessmentStatus::Active);
    }

    #[actix_web::test]
    async fn available_listing_drops_expired_assessments() {
        let mut mock = MockAssessmentRepository::new();
        mock.expect_list_by_status().returning(|_| {
            let mut current = stored_assessment("teacher-1", "Mathematics");
            current.status = AssessmentStatus::Active;
            let mut expired = stored_assessment("teacher-2", "Mathematics");
            expired.status = AssessmentStatus::Active;
            expired.deadline = Utc::now() - Duration::minutes(5);
            Ok(vec![current, expired])
        });

        let available = service_with(mock).list_available().await.unwrap();
        assert_eq!(available.len(), 1);
        assert!(available[0].deadline > Utc::now());
    }
}
