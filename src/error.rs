use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("revocation store error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("validation error: {0}")]
    Validation(String),

    /// Login rejection. Same kind and message whether the email was unknown
    /// or the password wrong.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Uniform rejection for every authentication-path failure (missing
    /// header, malformed token, bad signature, expiry, revocation, store
    /// errors during the revocation check). The internal cause is logged,
    /// never surfaced.
    #[error("authentication required")]
    Unauthorized,

    #[error("insufficient role")]
    Forbidden,

    #[error("email already in use")]
    DuplicateEmail,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Redis(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::DuplicateEmail => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error_type = match self {
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Redis(_) => "CACHE_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::Unauthorized => "AUTHENTICATION_ERROR",
            AppError::Forbidden => "AUTHORIZATION_ERROR",
            AppError::DuplicateEmail => "CONFLICT",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Internal(_) => "INTERNAL_ERROR",
        };

        // Infrastructure failures get a generic body; details stay in logs.
        let message = match self {
            AppError::Database(_) | AppError::Redis(_) | AppError::Internal(_) => {
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: error_type.to_string(),
            message,
        })
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl From<crate::security::TokenError> for AppError {
    fn from(e: crate::security::TokenError) -> Self {
        use crate::security::TokenError;
        match e {
            TokenError::Encoding(inner) => {
                AppError::Internal(format!("token encoding failed: {inner}"))
            }
            // Verification failures all collapse to the uniform rejection.
            _ => AppError::Unauthorized,
        }
    }
}
