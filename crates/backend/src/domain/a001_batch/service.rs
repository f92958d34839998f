use chrono::Utc;
use contracts::domain::a001_batch::aggregate::{Batch, BatchDto};
use contracts::domain::common::Identifier;
use sea_orm::{DatabaseConnection, TransactionTrait};

use super::repository;
use crate::domain::a002_batch_event::repository as event_repository;
use crate::domain::error::StoreError;

/// Record a new batch. The timeline of the returned batch is empty.
pub async fn create(db: &DatabaseConnection, dto: &BatchDto) -> Result<Batch, StoreError> {
    let new = dto.validate()?;
    let batch = Batch::from_new(Identifier::new(), new, Utc::now());

    repository::insert(db, &batch).await.map_err(|e| {
        tracing::error!("Failed to insert batch {}: {}", batch.id, e);
        e
    })?;

    tracing::info!(
        "Batch created: {} ({} from {})",
        batch.id,
        batch.product_name,
        batch.origin
    );
    Ok(batch)
}

/// Batch with its full timeline, read from one snapshot.
pub async fn get_by_id(db: &DatabaseConnection, id: Identifier) -> Result<Batch, StoreError> {
    let txn = db.begin().await?;

    let mut batch = repository::get_by_id(&txn, &id)
        .await?
        .ok_or_else(|| StoreError::batch_not_found(id))?;
    batch.events = event_repository::list_for_batch(&txn, &id).await?;

    txn.commit().await?;
    Ok(batch)
}

/// All batches, newest first, each with its timeline.
pub async fn list_all(db: &DatabaseConnection) -> Result<Vec<Batch>, StoreError> {
    Ok(repository::list_with_events(db).await?)
}

/// Remove a batch together with all of its events.
pub async fn delete(db: &DatabaseConnection, id: Identifier) -> Result<(), StoreError> {
    let txn = db.begin().await?;

    let removed_events = event_repository::delete_for_batch(&txn, &id).await?;
    if !repository::delete_by_id(&txn, &id).await? {
        // dropping txn rolls back
        return Err(StoreError::batch_not_found(id));
    }

    txn.commit().await?;
    tracing::info!("Batch deleted: {} ({} events removed)", id, removed_events);
    Ok(())
}
