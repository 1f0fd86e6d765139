use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::domain::solver_service::SolverError;

/// Failure surfaced to HTTP clients as `{"detail": ...}`
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Optimization engine not available. Preferred solver backend is not installed.")]
    Unavailable,

    #[error("Optimization failed: {0}")]
    SolveFailed(SolverError),

    #[error("{message}")]
    Validation { status: StatusCode, message: String },
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::SolveFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Validation { status, .. } => *status,
        }
    }
}

impl From<SolverError> for ApiError {
    fn from(error: SolverError) -> Self {
        match error {
            SolverError::SolverNotAvailable(_) => ApiError::Unavailable,
            other => ApiError::SolveFailed(other),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
