use actix_web::{delete, get, post, put, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::request::AnswerInput,
    services::AttemptContext,
};

fn context_from(auth: &AuthenticatedUser) -> AttemptContext {
    // Fall back to the email when the profile carries no display name.
    let display_name = if auth.0.display_name.trim().is_empty() {
        auth.0.email.clone()
    } else {
        auth.0.display_name.clone()
    };
    AttemptContext {
        user_id: auth.0.sub.clone(),
        display_name,
    }
}

/// Open a timed attempt on an active assessment.
#[post("/api/assessments/{id}/attempts")]
pub async fn start_attempt(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let view = state
        .attempt_service
        .start(&id, context_from(&auth))
        .await?;
    Ok(HttpResponse::Created().json(view))
}

/// Countdown and phase of an open attempt; after completion, the result.
#[get("/api/attempts/{id}")]
pub async fn get_attempt(
    state: web::Data<AppState>,
    id: web::Path<String>,
    _auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let status = state.attempt_service.status(&id).await?;
    Ok(HttpResponse::Ok().json(status))
}

#[put("/api/attempts/{id}/answers/{question_id}")]
pub async fn fill_answer(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    request: web::Json<AnswerInput>,
    _auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let (attempt_id, question_id) = path.into_inner();
    state
        .attempt_service
        .answer(&attempt_id, &question_id, request.into_inner().value)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[post("/api/attempts/{id}/submit")]
pub async fn submit_attempt(
    state: web::Data<AppState>,
    id: web::Path<String>,
    _auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let result = state.attempt_service.submit(&id).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Abandon the attempt, discarding every in-memory answer. The client asks
/// for confirmation before calling this.
#[delete("/api/attempts/{id}")]
pub async fn abandon_attempt(
    state: web::Data<AppState>,
    id: web::Path<String>,
    _auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    state.attempt_service.abandon(&id).await?;
    Ok(HttpResponse::NoContent().finish())
}
