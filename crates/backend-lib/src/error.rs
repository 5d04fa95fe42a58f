// ============================
// confmock-backend-lib/src/error.rs
// ============================
//! Central error type + Axum integration.
//!
//! Every failure surfaces as the vendor envelope
//! `{"error": {"code": "<http-status>", "message": ..., "details": ...}}`
//! so clients built against the real service parse our errors unchanged.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use confmock_common::ErrorEnvelope;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid date format")]
    InvalidDateRange,

    #[error("{0} not found: {1}")]
    NotFound(&'static str, String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    /// Missing-entity error with the vendor's `details` wording.
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        ApiError::NotFound(kind, id.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) | ApiError::InvalidDateRange => StatusCode::BAD_REQUEST,
            ApiError::NotFound(..) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Unauthenticated => "Authentication required".to_string(),
            ApiError::Validation(_) => "Validation failed".to_string(),
            ApiError::InvalidDateRange => "Invalid date format".to_string(),
            ApiError::NotFound(kind, _) => format!("{kind} not found"),
            _ => "Internal server error".to_string(),
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            ApiError::Unauthenticated => None,
            ApiError::Validation(details) => Some(details.clone()),
            ApiError::InvalidDateRange => Some("Use YYYY-MM-DD for from and to".to_string()),
            ApiError::NotFound(kind, id) => {
                Some(format!("No {} with id: {id}", kind.to_lowercase()))
            },
            ApiError::Internal(msg) => Some(msg.clone()),
            ApiError::Io(err) => Some(err.to_string()),
            ApiError::Json(err) => Some(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorEnvelope::new(status.as_u16().to_string(), self.message(), self.details());
        (status, axum::Json(body)).into_response()
    }
}

impl From<String> for ApiError {
    fn from(msg: String) -> Self {
        ApiError::Internal(msg)
    }
}

impl From<&str> for ApiError {
    fn from(msg: &str) -> Self {
        ApiError::Internal(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::Validation("name is required".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::InvalidDateRange.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::not_found("Meeting", "m1").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_found_wording() {
        let err = ApiError::not_found("Meeting", "m1");
        assert_eq!(err.message(), "Meeting not found");
        assert_eq!(err.details().as_deref(), Some("No meeting with id: m1"));
    }

    #[test]
    fn test_code_mirrors_http_status() {
        let response = ApiError::not_found("User", "u1").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("application/json"));
    }

    #[test]
    fn test_error_from_impls() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let api_err: ApiError = io_err.into();
        assert!(matches!(api_err, ApiError::Io(_)));

        let json_err: serde_json::Error =
            serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let api_err: ApiError = json_err.into();
        assert!(matches!(api_err, ApiError::Json(_)));

        let api_err: ApiError = "oops".into();
        assert!(matches!(api_err, ApiError::Internal(_)));
    }
}
