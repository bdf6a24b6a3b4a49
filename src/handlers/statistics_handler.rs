use actix_web::{get, web, HttpResponse};

use crate::{app_state::AppState, auth::AuthenticatedUser, errors::AppError};

/// Class statistics for an owned assessment. With no completed submissions
/// yet the body is an explicit `null`, not a zero-filled report.
#[get("/api/assessments/{id}/statistics")]
pub async fn get_statistics(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let assessment = state
        .assessment_service
        .get_owned(&id, &auth.0.sub)
        .await?;

    let statistics = state.statistics_service.for_assessment(&assessment).await?;
    Ok(HttpResponse::Ok().json(statistics))
}
