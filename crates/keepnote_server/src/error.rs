//! HTTP rendering of core errors.
//!
//! # Invariants
//! - Bodies never carry record ids or storage error text.
//! - Validation failures keep their field so clients can highlight it.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use keepnote_core::{ServiceError, ValidationError};
use log::error;
use serde_json::json;
use std::fmt::{Display, Formatter};

/// Field used for payload-level failures (malformed JSON and the like).
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    NotFound,
    InvalidPage,
    Validation(ValidationError),
    /// Already logged where it happened; rendered without detail.
    Internal(String),
}

impl ApiError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(ValidationError::new(field, message))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound | Self::InvalidPage => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::NotFound => write!(f, "not found"),
            Self::InvalidPage => write!(f, "invalid page"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Internal(details) => write!(f, "internal error: {details}"),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(value: ServiceError) -> Self {
        match value {
            ServiceError::NotFound { .. } => Self::NotFound,
            ServiceError::Validation(err) => Self::Validation(err),
            ServiceError::PageOutOfRange(_) => Self::InvalidPage,
            other => {
                error!(
                    "event=request_failed module=server status=error error_code={} error={}",
                    other.code(),
                    other
                );
                Self::Internal(other.code().to_string())
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::Unauthorized => json!({ "error": "invalid or missing token" }),
            Self::NotFound => json!({ "error": "not found" }),
            Self::InvalidPage => json!({ "error": "invalid page" }),
            Self::Validation(err) => json!({ "errors": { err.field: [err.message] } }),
            Self::Internal(_) => json!({ "error": "internal error" }),
        };
        (status, Json(body)).into_response()
    }
}
