pub mod assessment_handler;
pub mod attempt_handler;
pub mod auth_handler;
pub mod statistics_handler;

use actix_web::{get, web, HttpResponse};

use crate::{app_state::AppState, errors::AppError};

#[get("/api/health")]
pub async fn health_check(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    state.db.health_check().await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "ok" })))
}

/// Everything the server exposes; `main` and the integration tests share it.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check)
        .service(auth_handler::register)
        .service(auth_handler::login)
        .service(auth_handler::refresh)
        .service(auth_handler::logout)
        .service(assessment_handler::create_assessment)
        .service(assessment_handler::list_assessments)
        .service(assessment_handler::stream_assessments)
        .service(assessment_handler::list_available_assessments)
        .service(assessment_handler::get_assessment)
        .service(assessment_handler::update_assessment)
        .service(assessment_handler::delete_assessment)
        .service(statistics_handler::get_statistics)
        .service(attempt_handler::start_attempt)
        .service(attempt_handler::get_attempt)
        .service(attempt_handler::fill_answer)
        .service(attempt_handler::submit_attempt)
        .service(attempt_handler::abandon_attempt);
}
