//! Response envelope and error mapping for the HTTP layer.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Serialize;

use crate::core::DbError;

/// The `{success, message, data|error, timestamp}` envelope every endpoint
/// returns.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl ApiResponse<()> {
    pub fn failure(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error: Some(ErrorBody { code: code.into() }),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Error wrapper that renders the failure envelope with a matching status.
#[derive(Debug)]
pub struct WebError(pub DbError);

impl From<DbError> for WebError {
    fn from(err: DbError) -> Self {
        Self(err)
    }
}

impl WebError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            DbError::Validation(_) | DbError::MissingRequiredField(_) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            }
            DbError::TypeMismatch(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            DbError::TableNotFound(_)
            | DbError::ColumnNotFound(..)
            | DbError::RecordNotFound(..) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            DbError::TableExists(_)
            | DbError::ColumnExists(..)
            | DbError::ConstraintViolation(_) => (StatusCode::CONFLICT, "CONFLICT"),
            DbError::SchemaCorrupted(..)
            | DbError::ExecutionError(_)
            | DbError::IoError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR"),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let body = ApiResponse::failure(self.0.to_string(), code);
        (status, Json(body)).into_response()
    }
}

pub type WebResult<T> = std::result::Result<T, WebError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let (status, code) = WebError(DbError::Validation("bad".into())).status_and_code();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "VALIDATION_ERROR");

        let (status, code) =
            WebError(DbError::TableNotFound("orders".into())).status_and_code();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code, "NOT_FOUND");

        let (status, _) =
            WebError(DbError::ConstraintViolation("dup".into())).status_and_code();
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = WebError(DbError::ExecutionError("boom".into())).status_and_code();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_envelope_shape() {
        let ok = ApiResponse::success(serde_json::json!({"x": 1}), "done");
        let encoded = serde_json::to_value(&ok).unwrap();
        assert_eq!(encoded["success"], serde_json::json!(true));
        assert!(encoded.get("error").is_none());
        assert!(encoded["timestamp"].is_string());

        let failed = ApiResponse::failure("nope", "NOT_FOUND");
        let encoded = serde_json::to_value(&failed).unwrap();
        assert_eq!(encoded["success"], serde_json::json!(false));
        assert_eq!(encoded["error"]["code"], serde_json::json!("NOT_FOUND"));
        assert!(encoded.get("data").is_none());
    }
}
