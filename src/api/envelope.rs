//! Uniform response envelope.
//!
//! Success and failure share one JSON shape, distinguished by `status` and
//! `code`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: &'static str,
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub timestamp: String,
}

fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(code: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            status: "success",
            code: code.as_u16(),
            message: message.into(),
            data: Some(data),
            timestamp: now_iso8601(),
        }
    }

    pub fn success_empty(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: "success",
            code: code.as_u16(),
            message: message.into(),
            data: None,
            timestamp: now_iso8601(),
        }
    }

    pub fn error(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: "error",
            code: code.as_u16(),
            message: message.into(),
            data: None,
            timestamp: now_iso8601(),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_shape() {
        let envelope = ApiResponse::success(StatusCode::OK, "get user list", 42);
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["status"], "success");
        assert_eq!(json["code"], 200);
        assert_eq!(json["message"], "get user list");
        assert_eq!(json["data"], 42);
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_error_envelope_omits_data() {
        let envelope = ApiResponse::<()>::error(StatusCode::NOT_FOUND, "user not found");
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["status"], "error");
        assert_eq!(json["code"], 404);
        assert!(json.get("data").is_none());
    }
}
