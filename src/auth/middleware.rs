use std::future::{ready, Ready};

use actix_web::{http::header::AUTHORIZATION, FromRequest, HttpMessage, HttpRequest};

use crate::{
    auth::{claims::Claims, jwt::JwtService},
    errors::AppError,
};

/// Route guard: extracting this in a handler rejects the request unless it
/// carries a valid `Authorization: Bearer` access token. Sign-in and
/// registration endpoints simply do not extract it.
pub struct AuthenticatedUser(pub Claims);

fn claims_from_request(req: &HttpRequest) -> Result<Claims, AppError> {
    // A prior extraction on the same request already validated the token.
    if let Some(claims) = req.extensions().get::<Claims>() {
        return Ok(claims.clone());
    }

    let jwt_service = req
        .app_data::<actix_web::web::Data<JwtService>>()
        .ok_or_else(|| AppError::InternalError("JWT service not configured".to_string()))?;

    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Unauthorized("Invalid authorization header format".to_string())
    })?;

    let claims = jwt_service.validate_token(token)?;
    req.extensions_mut().insert(claims.clone());

    Ok(claims)
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        ready(claims_from_request(req).map(AuthenticatedUser))
    }
}
