use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::judge::JudgeError;

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Invalid input provided by the client (empty field, index out of range, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The initiator is not allowed to perform this action.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Requested room, session, or user was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// The judge rejected the request or could not be reached. Safe to retry;
    /// no submission is recorded when this is returned.
    #[error("judge unavailable")]
    External(#[source] JudgeError),
    /// A store backend failed.
    #[error("store failure")]
    Store(#[from] crate::dao::StoreError),
}

impl From<JudgeError> for ServiceError {
    fn from(err: JudgeError) -> Self {
        ServiceError::External(err)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Upstream judge failure; the client may retry.
    #[error("upstream error: {0}")]
    BadGateway(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::InvalidState(message) => AppError::Conflict(message),
            ServiceError::External(source) => AppError::BadGateway(source.to_string()),
            ServiceError::Store(source) => AppError::Internal(source.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
