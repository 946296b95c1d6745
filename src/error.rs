use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::services::policy::Denial;

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification every failure falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    Conflict,
    Invalid,
    Expired,
    Unauthorized,
    Internal,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    Invalid(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Denied(Denial),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Invalid(_) | Error::Validation(_) => ErrorKind::Invalid,
            Error::Unauthorized(_) => ErrorKind::Unauthorized,
            Error::TokenExpired => ErrorKind::Expired,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Denied(denial) => denial.kind(),
            Error::Conflict(_) | Error::InvalidState(_) => ErrorKind::Conflict,
            Error::Config(_) | Error::Database(_) | Error::Migrate(_) | Error::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Stable machine-readable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config(_) => "config_error",
            Error::Invalid(_) => "invalid_input",
            Error::Validation(_) => "validation_failed",
            Error::Unauthorized(_) => "unauthorized",
            Error::TokenExpired => "token_expired",
            Error::NotFound(_) => "not_found",
            Error::Denied(denial) => denial.code(),
            Error::Conflict(_) => "conflict",
            Error::InvalidState(_) => "invalid_state",
            Error::Database(_) | Error::Migrate(_) | Error::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::Denied(Denial::PaymentRequired) => StatusCode::PAYMENT_REQUIRED,
            other => match other.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Forbidden => StatusCode::FORBIDDEN,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::Invalid => StatusCode::BAD_REQUEST,
                ErrorKind::Expired if matches!(other, Error::TokenExpired) => {
                    StatusCode::UNAUTHORIZED
                }
                ErrorKind::Expired => StatusCode::BAD_REQUEST,
                ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let message = match self.kind() {
            ErrorKind::Internal => {
                tracing::error!(error = %self, "request failed");
                "An unexpected error occurred".to_string()
            }
            _ => self.to_string(),
        };

        let body = Json(json!({ "error": message, "code": self.code() }));
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                let constraint = db.constraint().unwrap_or("unique constraint").to_string();
                Error::Conflict(format!("Duplicate value violates {}", constraint))
            }
            other => Error::Database(other),
        }
    }
}

impl From<Denial> for Error {
    fn from(denial: Denial) -> Self {
        Error::Denied(denial)
    }
}
