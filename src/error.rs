use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::tts::BackendError;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Method not allowed, use {allowed}")]
    InvalidMethod { allowed: Method },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Upstream failure: {0}")]
    UpstreamFailure(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        AppError::UpstreamFailure(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, code) = match &self {
            AppError::InvalidMethod { .. } => (StatusCode::METHOD_NOT_ALLOWED, "INVALID_METHOD"),
            AppError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::UpstreamFailure(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_FAILURE"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {} - {}", code, message);
        } else {
            tracing::debug!("Request rejected: {} - {}", code, message);
        }

        let body = Json(ErrorResponse {
            error: message,
            code: code.to_string(),
        });

        match self {
            AppError::InvalidMethod { allowed } => {
                (status, [(header::ALLOW, allowed.to_string())], body).into_response()
            }
            _ => (status, body).into_response(),
        }
    }
}
