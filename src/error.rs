//! Overlay error types with HTTP status code mapping.
//!
//! [`OverlayError`] is the error every caller-facing operation returns. Each
//! variant maps to a numeric code and an HTTP status. Per-output admission
//! rejections are not errors; see [`crate::admission::RejectReason`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::Outpoint;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1003,
///     "message": "unsupported query: getEverything",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, `null` when there are none.
    pub details: Option<String>,
}

/// Caller-facing error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category   | HTTP Status               |
/// |-----------|------------|---------------------------|
/// | 1000–1999 | Request    | 400 Bad Request           |
/// | 2000–2999 | State      | 409 Conflict              |
/// | 3000–3999 | Server     | 500 Internal Server Error |
#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    /// Request body or parameter is malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Lookup addressed to a service this overlay does not host.
    #[error("lookup service not supported: {0}")]
    UnsupportedService(String),

    /// Lookup query name is not one this overlay answers.
    #[error("unsupported query: {0}")]
    UnsupportedQuery(String),

    /// Query requires a parameter that was not supplied.
    #[error("query {0} requires a parameter")]
    MissingParameter(String),

    /// An output reported as admitted does not decode into a record.
    #[error("malformed output {outpoint}: {reason}")]
    MalformedOutput {
        /// Output that failed to decode.
        outpoint: Outpoint,
        /// Why it failed.
        reason: String,
    },

    /// A record is already indexed under this outpoint.
    #[error("outpoint already indexed: {0}")]
    DuplicateOutpoint(Outpoint),

    /// Storage layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),
}

impl OverlayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::UnsupportedService(_) => 1002,
            Self::UnsupportedQuery(_) => 1003,
            Self::MissingParameter(_) => 1004,
            Self::MalformedOutput { .. } => 1005,
            Self::DuplicateOutpoint(_) => 2001,
            Self::PersistenceError(_) => 3001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_)
            | Self::UnsupportedService(_)
            | Self::UnsupportedQuery(_)
            | Self::MissingParameter(_)
            | Self::MalformedOutput { .. } => StatusCode::BAD_REQUEST,
            Self::DuplicateOutpoint(_) => StatusCode::CONFLICT,
            Self::PersistenceError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for OverlayError {
    fn from(err: sqlx::Error) -> Self {
        Self::PersistenceError(err.to_string())
    }
}

impl IntoResponse for OverlayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_errors_are_bad_request() {
        let errors = [
            OverlayError::InvalidRequest("x".to_string()),
            OverlayError::UnsupportedService("ls_other".to_string()),
            OverlayError::UnsupportedQuery("getEverything".to_string()),
            OverlayError::MissingParameter("getTopic".to_string()),
        ];
        for err in errors {
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
            assert!((1000..2000).contains(&err.error_code()));
        }
    }

    #[test]
    fn duplicate_outpoint_is_conflict() {
        let err = OverlayError::DuplicateOutpoint(Outpoint::new("aa", 0));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.error_code(), 2001);
        assert_eq!(err.to_string(), "outpoint already indexed: aa.0");
    }

    #[test]
    fn persistence_error_is_server_error() {
        let err = OverlayError::PersistenceError("connection refused".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn error_body_always_carries_details() {
        let body = ErrorResponse {
            error: ErrorBody {
                code: 1003,
                message: "unsupported query: getEverything".to_string(),
                details: None,
            },
        };
        let json = serde_json::to_value(&body).unwrap_or_default();
        assert_eq!(
            json,
            serde_json::json!({
                "error": {
                    "code": 1003,
                    "message": "unsupported query: getEverything",
                    "details": null
                }
            })
        );
    }
}
