use contracts::domain::a002_batch_event::aggregate::BatchEvent;
use contracts::domain::common::Identifier;
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::domain::a001_batch::repository as batch_repository;
use crate::domain::error::corrupt_row;
use crate::shared::data::columns::{
    date_to_text, instant_to_text, text_to_date, text_to_identifier, text_to_instant,
};

pub const TABLE: &str = "a002_batch_event";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "a002_batch_event")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub batch_id: String,
    pub event_type: String,
    pub description: String,
    /// YYYY-MM-DD
    pub timestamp: String,
    pub location: String,
    /// RFC 3339, nanosecond precision
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::domain::a001_batch::repository::Entity",
        from = "Column::BatchId",
        to = "crate::domain::a001_batch::repository::Column::Id",
        on_delete = "Cascade"
    )]
    Batch,
}

impl Related<batch_repository::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Batch.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for BatchEvent {
    type Error = DbErr;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        let corrupt = |reason: String| corrupt_row(TABLE, &m.id, reason);
        Ok(BatchEvent {
            id: text_to_identifier(&m.id).map_err(corrupt)?,
            batch_id: text_to_identifier(&m.batch_id).map_err(corrupt)?,
            timestamp: text_to_date(&m.timestamp).map_err(corrupt)?,
            created_at: text_to_instant(&m.created_at).map_err(corrupt)?,
            event_type: m.event_type,
            description: m.description,
            location: m.location,
        })
    }
}

pub async fn insert<C: ConnectionTrait>(db: &C, event: &BatchEvent) -> Result<(), DbErr> {
    let active = ActiveModel {
        id: Set(event.id.to_string()),
        batch_id: Set(event.batch_id.to_string()),
        event_type: Set(event.event_type.clone()),
        description: Set(event.description.clone()),
        timestamp: Set(date_to_text(event.timestamp)),
        location: Set(event.location.clone()),
        created_at: Set(instant_to_text(event.created_at)),
    };
    Entity::insert(active).exec_without_returning(db).await?;
    Ok(())
}

/// Timeline of one batch: event date ascending, then creation order.
pub async fn list_for_batch<C: ConnectionTrait>(
    db: &C,
    batch_id: &Identifier,
) -> Result<Vec<BatchEvent>, DbErr> {
    Entity::find()
        .filter(Column::BatchId.eq(batch_id.to_string()))
        .order_by_asc(Column::Timestamp)
        .order_by_asc(Column::CreatedAt)
        .order_by_asc(Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(BatchEvent::try_from)
        .collect()
}

pub async fn delete_for_batch<C: ConnectionTrait>(
    db: &C,
    batch_id: &Identifier,
) -> Result<u64, DbErr> {
    let result = Entity::delete_many()
        .filter(Column::BatchId.eq(batch_id.to_string()))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Events whose batch no longer exists. Always empty while foreign keys hold.
#[cfg(test)]
pub async fn count_orphans<C: ConnectionTrait>(db: &C) -> Result<u64, DbErr> {
    use sea_orm::sea_query::Query;

    Entity::find()
        .filter(
            Column::BatchId.not_in_subquery(
                Query::select()
                    .column(batch_repository::Column::Id)
                    .from(batch_repository::Entity)
                    .to_owned(),
            ),
        )
        .count(db)
        .await
}
