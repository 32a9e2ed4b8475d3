//! Error handling for the Libris HTTP layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use uuid::Uuid;

/// Body of every error response: `{"error": {...}}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub details: Vec<serde_json::Value>,
    pub trace_id: String,
    pub timestamp: String,
}

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation error: {message}")]
    Validation {
        details: Vec<serde_json::Value>,
        message: String,
    },

    #[error("conflict: {message}")]
    Conflict {
        details: Vec<serde_json::Value>,
        message: String,
    },

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("bad request: {message}")]
    BadRequest { message: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(details: Vec<serde_json::Value>, message: impl Into<String>) -> Self {
        Self::Validation {
            details,
            message: message.into(),
        }
    }

    pub fn conflict(details: Vec<serde_json::Value>, message: impl Into<String>) -> Self {
        Self::Conflict {
            details,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code carried in the envelope
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::Conflict { .. } => "conflict",
            Self::NotFound { .. } => "not_found",
            Self::Unauthorized { .. } => "unauthorized",
            Self::BadRequest { .. } => "bad_request",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let trace_id = Uuid::new_v4();
        let timestamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();
        let status = self.status();
        let code = self.code();

        if status.is_server_error() {
            tracing::error!(
                trace_id = %trace_id,
                error_code = code,
                status_code = status.as_u16(),
                error = %self,
                "request failed"
            );
        } else {
            tracing::warn!(
                trace_id = %trace_id,
                error_code = code,
                status_code = status.as_u16(),
                "request rejected"
            );
        }

        let (message, details) = match self {
            Self::Validation { details, message } | Self::Conflict { details, message } => {
                (message, details)
            }
            Self::NotFound { message }
            | Self::Unauthorized { message }
            | Self::BadRequest { message } => (message, Vec::new()),
            // Internal details stay in the log for release builds
            Self::Internal(_) if cfg!(not(debug_assertions)) => {
                ("An internal server error occurred".to_string(), Vec::new())
            }
            Self::Internal(err) => (format!("{err:#}"), Vec::new()),
        };

        let envelope = ErrorEnvelope {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
                trace_id: trace_id.to_string(),
                timestamp,
            },
        };

        (status, Json(envelope)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn envelope(error: AppError) -> (StatusCode, ErrorEnvelope) {
        let response = error.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_error_carries_field_details() {
        let details = vec![json!({"field": "title", "error": "required"})];
        let (status, body) = envelope(AppError::validation(details.clone(), "invalid book")).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.error.code, "validation_error");
        assert_eq!(body.error.message, "invalid book");
        assert_eq!(body.error.details, details);
        assert!(Uuid::parse_str(&body.error.trace_id).is_ok());
        assert!(OffsetDateTime::parse(&body.error.timestamp, &Rfc3339).is_ok());
    }

    #[tokio::test]
    async fn statuses_follow_the_variant() {
        assert_eq!(
            envelope(AppError::not_found("book '9' not found")).await.0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            envelope(AppError::conflict(vec![], "book is on loan")).await.0,
            StatusCode::CONFLICT
        );
        assert_eq!(
            envelope(AppError::unauthorized("login required")).await.0,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            envelope(AppError::bad_request("confirm=true required")).await.0,
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn internal_errors_map_to_500() {
        let (status, body) =
            envelope(AppError::Internal(anyhow::anyhow!("backend unavailable"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.code, "internal_error");
        assert!(body.error.details.is_empty());
    }
}
