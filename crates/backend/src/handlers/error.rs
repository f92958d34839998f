use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use contracts::domain::a002_batch_event::aggregate::BatchIdError;
use contracts::domain::common::{InvalidFormat, ValidationError};
use serde_json::json;

use crate::domain::error::StoreError;

/// Everything a handler can fail with, mapped onto HTTP statuses.
#[derive(Debug)]
pub enum ApiError {
    /// 400: identifier that does not follow the canonical grammar
    InvalidFormat(InvalidFormat),
    /// 422: request fields missing or not parseable
    Validation(ValidationError),
    /// 404
    NotFound(String),
    /// 503 when transient, 500 otherwise
    Storage { message: String, transient: bool },
}

impl From<InvalidFormat> for ApiError {
    fn from(e: InvalidFormat) -> Self {
        ApiError::InvalidFormat(e)
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::Validation(e)
    }
}

impl From<BatchIdError> for ApiError {
    fn from(e: BatchIdError) -> Self {
        match e {
            BatchIdError::Missing(v) => ApiError::Validation(v),
            BatchIdError::Malformed(f) => ApiError::InvalidFormat(f),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Validation(v) => ApiError::Validation(v),
            StoreError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            StoreError::Storage(_) => ApiError::Storage {
                transient: e.is_transient(),
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::InvalidFormat(e) => (
                StatusCode::BAD_REQUEST,
                json!({ "detail": format!("Invalid ID format: '{}'", e.input) }),
            ),
            ApiError::Validation(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "detail": e.to_string(), "fields": e.fields }),
            ),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, json!({ "detail": message })),
            ApiError::Storage { message, transient } => {
                tracing::error!("Storage failure (transient: {}): {}", transient, message);
                let status = if transient {
                    StatusCode::SERVICE_UNAVAILABLE
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                (status, json!({ "detail": "Storage failure, see server log" }))
            }
        };
        (status, Json(body)).into_response()
    }
}
