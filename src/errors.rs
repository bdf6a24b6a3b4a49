use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not available: {0}")]
    NotAvailable(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("This email address is already registered")]
    EmailInUse,

    #[error("Invalid credentials. Check your email and password")]
    InvalidCredential,

    #[error("The password is too weak")]
    WeakPassword,

    #[error("This account has been disabled")]
    AccountDisabled,

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::NotAvailable(_) => "NOT_AVAILABLE",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::EmailInUse => "EMAIL_IN_USE",
            AppError::InvalidCredential => "INVALID_CREDENTIAL",
            AppError::WeakPassword => "WEAK_PASSWORD",
            AppError::AccountDisabled => "ACCOUNT_DISABLED",
            AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::NotAvailable(_) => StatusCode::CONFLICT,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::EmailInUse => StatusCode::CONFLICT,
            AppError::InvalidCredential => StatusCode::UNAUTHORIZED,
            AppError::WeakPassword => StatusCode::BAD_REQUEST,
            AppError::AccountDisabled => StatusCode::FORBIDDEN,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
            code: self.error_code(),
        })
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for AppError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        AppError::InternalError(format!("BSON serialization error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            AppError::NotFound("test".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::NotAvailable("test".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::ValidationError("test".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::EmailInUse.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::InvalidCredential.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::WeakPassword.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::AccountDisabled.status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_identity_error_codes() {
        assert_eq!(AppError::EmailInUse.error_code(), "EMAIL_IN_USE");
        assert_eq!(AppError::InvalidCredential.error_code(), "INVALID_CREDENTIAL");
        assert_eq!(AppError::WeakPassword.error_code(), "WEAK_PASSWORD");
        assert_eq!(AppError::AccountDisabled.error_code(), "ACCOUNT_DISABLED");
    }

    #[test]
    fn test_error_messages() {
        let err = AppError::NotFound("assessment".into());
        assert_eq!(err.to_string(), "Not found: assessment");

        let err = AppError::InvalidCredential;
        assert!(err.to_string().contains("email and password"));
    }
}
