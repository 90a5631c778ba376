// SPDX-License-Identifier: MIT

//! Application error types with consistent API responses.
//!
//! Every handler funnels failures into [`AppError`]; the `IntoResponse`
//! impl is the single place the error envelope is shaped.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// A single field-level validation failure.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Input failed validation; carries every field violation found.
    #[error("Validation Error")]
    Validation(Vec<FieldError>),

    #[error("Authentication required")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    /// Image vendor returned HTTP 429.
    #[error("API rate limit exceeded. Please try again later.")]
    UpstreamRateLimited,

    /// Image vendor returned HTTP 402.
    #[error("API usage limit reached. Please check your subscription.")]
    UpstreamQuotaExceeded,

    /// Any other image vendor or transport failure. The detail is logged,
    /// never sent to the caller.
    #[error("Failed to generate image")]
    ImageGeneration(String),

    /// Store failure. The detail is logged, never sent to the caller.
    #[error("Database error")]
    Database(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status code for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UpstreamRateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::UpstreamQuotaExceeded => StatusCode::PAYMENT_REQUIRED,
            AppError::ImageGeneration(_) | AppError::Database(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// JSON error envelope: `{ "error": { "message": ..., "status": ... } }`.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldError>>,
}

#[derive(Serialize)]
struct ErrorDetail {
    message: String,
    status: u16,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            AppError::ImageGeneration(detail) => {
                tracing::error!(error = %detail, "Image generation failed");
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
            }
            _ => {}
        }

        let errors = match self {
            AppError::Validation(ref fields) => Some(fields.clone()),
            _ => None,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                message: self.to_string(),
                status: status.as_u16(),
            },
            errors,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            AppError::Validation(vec![]).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Forbidden("nope".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::UpstreamRateLimited.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::UpstreamQuotaExceeded.status(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            AppError::ImageGeneration("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn vendor_error_message_is_generic() {
        let err = AppError::ImageGeneration("segmind timed out after 60s".into());
        assert_eq!(err.to_string(), "Failed to generate image");
    }

    #[tokio::test]
    async fn backend_detail_is_hidden_from_callers() {
        let err = AppError::Database(
            "firestore: PERMISSION_DENIED at projects/secret-proj".to_string(),
        );
        assert_eq!(err.to_string(), "Database error");

        let response = err.into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(!body.contains("secret-proj"));
        assert!(body.contains("Database error"));

        let err = AppError::Internal(anyhow::anyhow!("stack detail with paths"));
        assert_eq!(err.to_string(), "Internal server error");
    }
}
