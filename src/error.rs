use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{password::PasswordError, repository::RepositoryError};

/// AppError
///
/// The error type shared by the service layer and the REST handlers. Every variant
/// maps onto exactly one HTTP status; page handlers translate it into redirects instead.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Invalid user input (blank names, non-positive age, empty password...).
    #[error("{0}")]
    Validation(String),

    #[error("User not authenticated")]
    Unauthorized,

    #[error("Access denied")]
    Forbidden,

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Role not found by name: {0}")]
    RoleNotFound(String),

    #[error("Role not found by id: {0}")]
    RoleIdNotFound(i64),

    #[error("User with this email already exists")]
    EmailTaken(String),

    #[error("Role already exists: {0}")]
    DuplicateRole(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::UserNotFound(_) | AppError::RoleNotFound(_) | AppError::RoleIdNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AppError::EmailTaken(_) | AppError::DuplicateRole(_) => StatusCode::CONFLICT,
            AppError::Repository(RepositoryError::Duplicate(_)) => StatusCode::CONFLICT,
            AppError::Repository(RepositoryError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Repository(_)
            | AppError::Password(_)
            | AppError::Token(_)
            | AppError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

/// ErrorResponse
///
/// JSON body returned for every failed REST call.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal details stay in the logs; clients get a generic message.
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error: status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
            message,
            status_code: status.as_u16(),
        };

        (status, Json(body)).into_response()
    }
}
