use axum::extract::{Path, State};
use axum::Json;
use contracts::domain::a002_batch_event::aggregate::{BatchEvent, BatchEventDto};
use contracts::domain::common::Identifier;

use super::error::ApiError;
use super::extract::ApiJson;
use crate::domain::a002_batch_event;
use crate::routes::AppState;

/// POST /event
pub async fn create(
    State(state): State<AppState>,
    ApiJson(dto): ApiJson<BatchEventDto>,
) -> Result<Json<BatchEvent>, ApiError> {
    let batch_id = dto.batch_id()?;

    let event = a002_batch_event::service::create(&state.db, batch_id, &dto).await?;
    Ok(Json(event))
}

/// GET /batch/:id/events
pub async fn list_for_batch(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<BatchEvent>>, ApiError> {
    let batch_id = Identifier::parse(&id)?;
    Ok(Json(
        a002_batch_event::service::list_for_batch(&state.db, batch_id).await?,
    ))
}
