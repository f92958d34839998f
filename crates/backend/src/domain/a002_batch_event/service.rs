use chrono::Utc;
use contracts::domain::a002_batch_event::aggregate::{BatchEvent, BatchEventDto};
use contracts::domain::common::Identifier;
use sea_orm::{DatabaseConnection, TransactionTrait};

use super::repository;
use crate::domain::a001_batch::repository as batch_repository;
use crate::domain::error::{is_foreign_key_violation, StoreError};

/// Append an event to the timeline of `batch_id`.
///
/// A missing batch is reported before any field error. The insert is a
/// single statement outside any transaction, so it waits for the write lock
/// like every other writer; if the batch is deleted after the existence
/// check, the foreign key rejects the insert and the result is NotFound.
/// `dto.batch_id` is ignored, the caller passes the parsed id.
pub async fn create(
    db: &DatabaseConnection,
    batch_id: Identifier,
    dto: &BatchEventDto,
) -> Result<BatchEvent, StoreError> {
    if !batch_repository::exists(db, &batch_id).await? {
        return Err(StoreError::batch_not_found(batch_id));
    }

    let new = dto.validate()?;
    let event = BatchEvent::from_new(Identifier::new(), batch_id, new, Utc::now());

    if let Err(e) = repository::insert(db, &event).await {
        if is_foreign_key_violation(&e) {
            tracing::info!("Batch {} deleted before event insert", batch_id);
            return Err(StoreError::batch_not_found(batch_id));
        }
        tracing::error!("Failed to insert event for batch {}: {}", batch_id, e);
        return Err(e.into());
    }

    tracing::info!(
        "Event created: {} '{}' on {} for batch {}",
        event.id,
        event.event_type,
        event.timestamp,
        batch_id
    );
    Ok(event)
}

/// Timeline of a batch without the batch envelope.
pub async fn list_for_batch(
    db: &DatabaseConnection,
    batch_id: Identifier,
) -> Result<Vec<BatchEvent>, StoreError> {
    let txn = db.begin().await?;

    if !batch_repository::exists(&txn, &batch_id).await? {
        return Err(StoreError::batch_not_found(batch_id));
    }
    let events = repository::list_for_batch(&txn, &batch_id).await?;

    txn.commit().await?;
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a001_batch::service as batch_service;
    use crate::shared::data::db::{connect_file, connect_in_memory};
    use contracts::domain::a001_batch::aggregate::{Batch, BatchDto};
    use std::collections::HashSet;

    async fn apples(db: &DatabaseConnection) -> Batch {
        batch_service::create(
            db,
            &BatchDto {
                product_name: Some("Organic Apples".into()),
                origin: Some("Oregon Farm".into()),
                harvest_date: Some("2024-01-20".into()),
            },
        )
        .await
        .unwrap()
    }

    fn event_dto(event_type: &str, date: &str) -> BatchEventDto {
        BatchEventDto {
            event_type: Some(event_type.into()),
            description: Some("Washed and sorted".into()),
            timestamp: Some(date.into()),
            location: Some("Plant A".into()),
            batch_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_event_attaches_to_batch() {
        let db = connect_in_memory().await;
        let batch = apples(&db).await;

        let event = create(&db, batch.id, &event_dto("Processing", "2024-01-21"))
            .await
            .unwrap();
        assert_eq!(event.batch_id, batch.id);
        assert_eq!(event.event_type, "Processing");
        assert_eq!(event.location, "Plant A");

        let loaded = batch_service::get_by_id(&db, batch.id).await.unwrap();
        assert_eq!(loaded.events, vec![event]);
    }

    #[tokio::test]
    async fn test_create_event_for_unknown_batch() {
        let db = connect_in_memory().await;
        let missing = Identifier::new();

        match create(&db, missing, &event_dto("Processing", "2024-01-21")).await {
            Err(StoreError::NotFound { id, .. }) => assert_eq!(id, missing),
            other => panic!("expected not found, got {other:?}"),
        }
        assert_eq!(repository::count_orphans(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_batch_reported_before_field_errors() {
        let db = connect_in_memory().await;
        let result = create(&db, Identifier::new(), &BatchEventDto::default()).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_create_event_validation() {
        let db = connect_in_memory().await;
        let batch = apples(&db).await;
        let dto = BatchEventDto {
            location: None,
            ..event_dto("Shipping", "not-a-date")
        };

        match create(&db, batch.id, &dto).await {
            Err(StoreError::Validation(e)) => {
                assert!(e.has_field("location"));
                assert!(e.has_field("timestamp"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(list_for_batch(&db, batch.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_timeline_ordered_by_event_date() {
        let db = connect_in_memory().await;
        let batch = apples(&db).await;

        for (kind, date) in [
            ("Shipping", "2024-01-23"),
            ("Processing", "2024-01-21"),
            ("Packaging", "2024-01-22"),
        ] {
            create(&db, batch.id, &event_dto(kind, date)).await.unwrap();
        }

        let events = list_for_batch(&db, batch.id).await.unwrap();
        let kinds: Vec<&str> = events.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(kinds, vec!["Processing", "Packaging", "Shipping"]);
    }

    #[tokio::test]
    async fn test_same_day_events_keep_creation_order() {
        let db = connect_in_memory().await;
        let batch = apples(&db).await;

        let mut created = Vec::new();
        for kind in ["Sorting", "Washing", "Drying", "Waxing"] {
            created.push(create(&db, batch.id, &event_dto(kind, "2024-01-21")).await.unwrap());
        }

        let events = list_for_batch(&db, batch.id).await.unwrap();
        assert_eq!(events, created);
    }

    #[tokio::test]
    async fn test_list_for_unknown_batch() {
        let db = connect_in_memory().await;
        assert!(matches!(
            list_for_batch(&db, Identifier::new()).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_event_creation() {
        let dir = tempfile::tempdir().unwrap();
        let db = connect_file(dir.path(), 5).await;
        let batch_id = apples(&db).await.id;

        let handles: Vec<_> = (0..24)
            .map(|i| {
                let db = db.clone();
                let date = format!("2024-02-{:02}", 24 - i);
                tokio::spawn(async move {
                    create(&db, batch_id, &event_dto("Inspection", &date)).await
                })
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            match handle.await.unwrap() {
                Ok(event) => assert!(ids.insert(event.id)),
                Err(e) => panic!("concurrent create failed: {e}"),
            }
        }

        let events = list_for_batch(&db, batch_id).await.unwrap();
        assert_eq!(events.len(), 24);
        assert!(events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert!(events.iter().all(|e| ids.contains(&e.id)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_create_racing_delete_leaves_no_orphan() {
        let dir = tempfile::tempdir().unwrap();
        let db = connect_file(dir.path(), 5).await;

        for _ in 0..10 {
            let batch_id = apples(&db).await.id;

            let creators: Vec<_> = (0..8)
                .map(|_| {
                    let db = db.clone();
                    tokio::spawn(async move {
                        create(&db, batch_id, &event_dto("Processing", "2024-01-21")).await
                    })
                })
                .collect();
            let deleter = {
                let db = db.clone();
                tokio::spawn(async move { batch_service::delete(&db, batch_id).await })
            };

            for handle in creators {
                match handle.await.unwrap() {
                    Ok(_) | Err(StoreError::NotFound { .. }) => {}
                    Err(e) => panic!("create racing delete failed: {e}"),
                }
            }
            deleter.await.unwrap().unwrap();

            assert!(repository::list_for_batch(&db, &batch_id)
                .await
                .unwrap()
                .is_empty());
        }
        assert_eq!(repository::count_orphans(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_insert_for_deleted_batch_is_foreign_key_violation() {
        let db = connect_in_memory().await;
        let batch_id = apples(&db).await.id;
        batch_service::delete(&db, batch_id).await.unwrap();

        let new = event_dto("Processing", "2024-01-21").validate().unwrap();
        let event = BatchEvent::from_new(Identifier::new(), batch_id, new, Utc::now());
        let err = repository::insert(&db, &event).await.unwrap_err();
        assert!(is_foreign_key_violation(&err));
        assert_eq!(repository::count_orphans(&db).await.unwrap(), 0);
    }
}
