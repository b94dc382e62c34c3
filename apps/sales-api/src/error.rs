//! Error types for the Sales API.
//!
//! Every handler returns [`ApiResult`]. Domain and database errors convert
//! into [`ApiError`], which renders as a JSON body:
//!
//! ```json
//! { "code": "validation_error", "message": "...", "errors": [{ "field": "...", "message": "..." }] }
//! ```

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use tally_core::{CoreError, FieldFailure, ValidationReport};
use tally_db::DbError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Sales API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(ValidationReport),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Malformed `{id}` path segment.
    pub fn invalid_id(raw: &str) -> Self {
        ApiError::BadRequest(format!("Invalid sale id: {raw}"))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    pub errors: Vec<FieldFailure>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let body = match self {
            ApiError::Validation(report) => ErrorBody {
                code,
                message: "Validation failed".to_string(),
                errors: report.into_failures(),
            },
            ApiError::Internal(detail) => {
                // Logged here, never sent to the client
                error!(%detail, "Request failed with internal error");
                ErrorBody {
                    code,
                    message: "An unexpected error occurred".to_string(),
                    errors: Vec::new(),
                }
            }
            other => ErrorBody {
                code,
                message: other.to_string(),
                errors: Vec::new(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Validation(report) => ApiError::Validation(report),
            CoreError::SaleNotFound(_) => ApiError::NotFound(error.to_string()),
            CoreError::DuplicateSaleNumber(_) => ApiError::Conflict(error.to_string()),
            CoreError::InvalidQuantity { .. } => ApiError::BadRequest(error.to_string()),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(error: DbError) -> Self {
        match error {
            DbError::NotFound { ref id, .. } => {
                ApiError::NotFound(format!("Sale with ID {id} not found"))
            }
            DbError::UniqueViolation { ref field, ref value } if field == "sale_number" => {
                ApiError::Conflict(CoreError::DuplicateSaleNumber(value.clone()).to_string())
            }
            DbError::UniqueViolation { .. } => ApiError::Conflict(error.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
