use contracts::domain::a001_batch::aggregate::Batch;
use contracts::domain::a002_batch_event::aggregate::{sort_timeline, BatchEvent};
use contracts::domain::common::Identifier;
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, EntityTrait, Set};

use crate::domain::a002_batch_event::repository as event_repository;
use crate::domain::error::corrupt_row;
use crate::shared::data::columns::{
    date_to_text, instant_to_text, text_to_date, text_to_identifier, text_to_instant,
};

pub const TABLE: &str = "a001_batch";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "a001_batch")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub product_name: String,
    pub origin: String,
    /// YYYY-MM-DD
    pub harvest_date: String,
    /// RFC 3339, nanosecond precision
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "crate::domain::a002_batch_event::repository::Entity")]
    Events,
}

impl Related<event_repository::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Events.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Batch {
    type Error = DbErr;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        let corrupt = |reason: String| corrupt_row(TABLE, &m.id, reason);
        Ok(Batch {
            id: text_to_identifier(&m.id).map_err(corrupt)?,
            harvest_date: text_to_date(&m.harvest_date).map_err(corrupt)?,
            created_at: text_to_instant(&m.created_at).map_err(corrupt)?,
            product_name: m.product_name,
            origin: m.origin,
            events: Vec::new(),
        })
    }
}

pub async fn insert<C: ConnectionTrait>(db: &C, batch: &Batch) -> Result<(), DbErr> {
    let active = ActiveModel {
        id: Set(batch.id.to_string()),
        product_name: Set(batch.product_name.clone()),
        origin: Set(batch.origin.clone()),
        harvest_date: Set(date_to_text(batch.harvest_date)),
        created_at: Set(instant_to_text(batch.created_at)),
    };
    Entity::insert(active).exec_without_returning(db).await?;
    Ok(())
}

/// Batch envelope only, `events` is left empty.
pub async fn get_by_id<C: ConnectionTrait>(db: &C, id: &Identifier) -> Result<Option<Batch>, DbErr> {
    Entity::find_by_id(id.to_string())
        .one(db)
        .await?
        .map(Batch::try_from)
        .transpose()
}

pub async fn exists<C: ConnectionTrait>(db: &C, id: &Identifier) -> Result<bool, DbErr> {
    let count = Entity::find_by_id(id.to_string()).count(db).await?;
    Ok(count > 0)
}

/// Every batch with its timeline, newest batch first.
pub async fn list_with_events<C: ConnectionTrait>(db: &C) -> Result<Vec<Batch>, DbErr> {
    let rows = Entity::find()
        .find_with_related(event_repository::Entity)
        .all(db)
        .await?;

    let mut batches = Vec::with_capacity(rows.len());
    for (model, event_models) in rows {
        let mut batch = Batch::try_from(model)?;
        batch.events = event_models
            .into_iter()
            .map(BatchEvent::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        sort_timeline(&mut batch.events);
        batches.push(batch);
    }

    batches.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    Ok(batches)
}

/// Hard delete of the batch row. Returns false when nothing matched.
pub async fn delete_by_id<C: ConnectionTrait>(db: &C, id: &Identifier) -> Result<bool, DbErr> {
    let result = Entity::delete_by_id(id.to_string()).exec(db).await?;
    Ok(result.rows_affected > 0)
}
