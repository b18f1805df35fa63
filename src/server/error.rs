//! Mapping of service failures onto HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::{ServiceError, ServiceErrorKind};

/// JSON error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable message.
    pub error: String,
}

/// Handler failure.
#[derive(Debug)]
pub enum AppError {
    /// Resource not found.
    NotFound(String),
    /// Invalid request.
    BadRequest(String),
    /// Anything else.
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => {
                warn!(error = %msg, "Bad request");
                (StatusCode::BAD_REQUEST, msg)
            }
            AppError::Internal(msg) => {
                error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };
        (status, Json(ApiError { error: message })).into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err.kind {
            ServiceErrorKind::NotFound => AppError::NotFound(err.message),
            ServiceErrorKind::Invalid | ServiceErrorKind::Conflict => {
                AppError::BadRequest(err.message)
            }
            ServiceErrorKind::Storage => AppError::Internal(err.message),
        }
    }
}
