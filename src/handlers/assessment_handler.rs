use actix_web::{delete, get, post, put, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::request::{AssessmentListQuery, SaveAssessmentRequest},
    models::dto::response::AvailableAssessment,
};

#[post("/api/assessments")]
pub async fn create_assessment(
    state: web::Data<AppState>,
    request: web::Json<SaveAssessmentRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let assessment = state
        .assessment_service
        .create(request.into_inner(), &auth.0.sub)
        .await?;
    Ok(HttpResponse::Created().json(assessment))
}

/// The signed-in owner's assessments, with optional `search`, `status` and
/// `category` query filters.
#[get("/api/assessments")]
pub async fn list_assessments(
    state: web::Data<AppState>,
    query: web::Query<AssessmentListQuery>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let assessments = state
        .assessment_service
        .list_by_owner(&auth.0.sub, &query)
        .await?;
    Ok(HttpResponse::Ok().json(assessments))
}

/// Live owner listing as server-sent events: one `data:` frame per change to
/// the underlying collection. Disconnecting drops the subscription, which
/// cancels the change-stream task.
#[get("/api/assessments/live")]
pub async fn stream_assessments(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let subscription = state
        .assessment_service
        .watch_by_owner(&auth.0.sub)
        .await?;

    let stream = futures::stream::unfold(subscription, |mut subscription| async move {
        let assessments = subscription.next().await?;
        let payload = serde_json::to_string(&assessments).ok()?;
        let frame = web::Bytes::from(format!("data: {}\n\n", payload));
        Some((Ok::<_, AppError>(frame), subscription))
    });

    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .streaming(stream))
}

/// What students can take right now, without the answer keys.
#[get("/api/assessments/available")]
pub async fn list_available_assessments(
    state: web::Data<AppState>,
    _auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let assessments = state.assessment_service.list_available().await?;
    let cards: Vec<AvailableAssessment> =
        assessments.iter().map(AvailableAssessment::from).collect();
    Ok(HttpResponse::Ok().json(cards))
}

#[get("/api/assessments/{id}")]
pub async fn get_assessment(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let assessment = state
        .assessment_service
        .get_owned(&id, &auth.0.sub)
        .await?;
    Ok(HttpResponse::Ok().json(assessment))
}

#[put("/api/assessments/{id}")]
pub async fn update_assessment(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<SaveAssessmentRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let assessment = state
        .assessment_service
        .update(&id, request.into_inner(), &auth.0.sub)
        .await?;
    Ok(HttpResponse::Ok().json(assessment))
}

#[delete("/api/assessments/{id}")]
pub async fn delete_assessment(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    state
        .assessment_service
        .delete(&id, &auth.0.sub)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
