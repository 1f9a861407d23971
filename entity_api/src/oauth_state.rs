use super::error::Error;
use chrono::{DateTime, Utc};
use entity::oauth_states::{ActiveModel, Column, Entity, Model};
use log::debug;
use sea_orm::{entity::prelude::*, sea_query::OnConflict, ConnectionTrait, Set};

/// Inserts or replaces the pending state stored under `key`.
pub async fn upsert(
    db: &impl ConnectionTrait,
    key: &str,
    payload: Json,
    expires_at: DateTime<Utc>,
) -> Result<(), Error> {
    let now = Utc::now();

    let active_model = ActiveModel {
        key: Set(key.to_owned()),
        payload: Set(payload),
        expires_at: Set(expires_at.into()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    Entity::insert(active_model)
        .on_conflict(
            OnConflict::column(Column::Key)
                .update_columns([Column::Payload, Column::ExpiresAt, Column::UpdatedAt])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    Ok(())
}

/// Finds the state stored under `key` unless it has expired
pub async fn find_live(db: &impl ConnectionTrait, key: &str) -> Result<Option<Model>, Error> {
    Ok(Entity::find_by_id(key.to_owned())
        .filter(Column::ExpiresAt.gt(Utc::now()))
        .one(db)
        .await?)
}

/// Deletes every expired state, returning how many rows were removed
pub async fn purge_expired(db: &impl ConnectionTrait) -> Result<u64, Error> {
    let result = Entity::delete_many()
        .filter(Column::ExpiresAt.lte(Utc::now()))
        .exec(db)
        .await?;

    debug!("Purged {} expired oauth states", result.rows_affected);
    Ok(result.rows_affected)
}
