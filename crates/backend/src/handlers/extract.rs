use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::{async_trait, Json};
use contracts::domain::common::ValidationError;
use serde::de::DeserializeOwned;

use super::error::ApiError;

/// Request body extractor that fails with an [`ApiError`] instead of axum's
/// plain-text rejection.
///
/// Usage in handlers: `async fn handler(ApiJson(dto): ApiJson<BatchDto>) -> ...`
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(ValidationError::single("body", rejection.body_text()))
    }
}
