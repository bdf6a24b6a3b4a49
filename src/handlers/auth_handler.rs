use actix_web::{post, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::request::{LoginRequest, RefreshRequest, RegisterRequest},
};

#[post("/api/auth/register")]
pub async fn register(
    state: web::Data<AppState>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let response = state.user_service.register(request.into_inner()).await?;
    Ok(HttpResponse::Created().json(response))
}

#[post("/api/auth/login")]
pub async fn login(
    state: web::Data<AppState>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let response = state.user_service.login(request.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/api/auth/refresh")]
pub async fn refresh(
    state: web::Data<AppState>,
    request: web::Json<RefreshRequest>,
) -> Result<HttpResponse, AppError> {
    let response = state
        .user_service
        .refresh(&request.into_inner().refresh_token)
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/api/auth/logout")]
pub async fn logout(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    state.user_service.logout(&auth.0.sub).await?;
    Ok(HttpResponse::NoContent().finish())
}
