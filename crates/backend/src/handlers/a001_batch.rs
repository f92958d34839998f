use axum::extract::{Path, State};
use axum::Json;
use contracts::domain::a001_batch::aggregate::{Batch, BatchCreationResponse, BatchDto};
use contracts::domain::common::Identifier;

use super::error::ApiError;
use super::extract::ApiJson;
use crate::domain::a001_batch;
use crate::routes::AppState;

/// POST /batch
pub async fn create(
    State(state): State<AppState>,
    ApiJson(dto): ApiJson<BatchDto>,
) -> Result<Json<BatchCreationResponse>, ApiError> {
    let batch = a001_batch::service::create(&state.db, &dto).await?;
    Ok(Json(BatchCreationResponse::new(
        &batch,
        &state.frontend_base_url,
    )))
}

/// GET /batches
pub async fn list_all(State(state): State<AppState>) -> Result<Json<Vec<Batch>>, ApiError> {
    Ok(Json(a001_batch::service::list_all(&state.db).await?))
}

/// GET /batch/:id
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Batch>, ApiError> {
    let id = Identifier::parse(&id)?;
    Ok(Json(a001_batch::service::get_by_id(&state.db, id).await?))
}
