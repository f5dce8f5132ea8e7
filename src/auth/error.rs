//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::envelope::ApiResponse;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No credentials on a request that requires them.
    #[error("missing authorization")]
    MissingAuth,

    /// Malformed Authorization header.
    #[error("invalid authorization header format")]
    InvalidAuthHeader,

    /// Bad signature, malformed token, or wrong token kind.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token expired")]
    TokenExpired,

    /// Bad credentials or disabled account.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Refresh token rejected or principal no longer resolvable.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Authenticated, but lacking a required authority.
    #[error("insufficient authority: {0}")]
    InsufficientAuthority(String),

    /// Blank token where one is required.
    #[error("token must not be blank")]
    BlankToken,

    #[error("internal auth error: {0}")]
    Internal(String),
}

impl AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingAuth
            | AuthError::InvalidAuthHeader
            | AuthError::InvalidToken(_)
            | AuthError::TokenExpired
            | AuthError::AccessDenied(_) => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden(_) | AuthError::InsufficientAuthority(_) => StatusCode::FORBIDDEN,
            AuthError::BlankToken => StatusCode::BAD_REQUEST,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "auth error");
            }
            _ => {
                tracing::debug!(message = %self, "auth rejection");
            }
        }

        ApiResponse::<()>::error(status, self.to_string()).into_response()
    }
}

impl From<crate::user::UserError> for AuthError {
    fn from(err: crate::user::UserError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_display() {
        assert_eq!(
            AuthError::MissingAuth.to_string(),
            "missing authorization"
        );
        assert_eq!(
            AuthError::InvalidToken("bad".to_string()).to_string(),
            "invalid token: bad"
        );
    }

    #[test]
    fn test_store_errors_stay_internal() {
        let err: AuthError = crate::user::UserError::NotFound("role".to_string()).into();
        assert!(matches!(&err, AuthError::Internal(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AuthError::AccessDenied("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(AuthError::BlankToken.status_code(), StatusCode::BAD_REQUEST);
    }
}
