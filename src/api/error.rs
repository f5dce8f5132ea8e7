//! Unified API error handling.
//!
//! Business failures are raised as typed errors at the point of detection and
//! translated to the response envelope here, at the boundary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{debug, error};

use super::envelope::ApiResponse;
use crate::user::UserError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            ApiError::Internal(msg) => {
                error!(message = %msg, "API error");
            }
            _ => {
                debug!(message = %self, "client error");
            }
        }

        ApiResponse::<()>::error(status, self.to_string()).into_response()
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(what) => ApiError::NotFound(format!("{what} not found")),
            UserError::InvalidInput(msg) => ApiError::InvalidInput(msg),
            UserError::Database(e) => ApiError::Internal(e.to_string()),
            UserError::Hash(e) => ApiError::Internal(e.to_string()),
        }
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
