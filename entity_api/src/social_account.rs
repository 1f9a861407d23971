use super::error::Error;
use entity::social_accounts::{ActiveModel, Model};
use log::debug;
use sea_orm::{entity::prelude::*, ConnectionTrait, Set};

/// Creates a new social account record, keeping the caller's id
pub async fn create(db: &impl ConnectionTrait, model: Model) -> Result<Model, Error> {
    debug!(
        "Creating social account for user_id: {}, network: {}",
        model.user_id, model.network
    );

    let now = chrono::Utc::now();

    let active_model = ActiveModel {
        id: Set(model.id),
        user_id: Set(model.user_id),
        network: Set(model.network),
        account_id: Set(model.account_id),
        access_token: Set(model.access_token),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    Ok(active_model.insert(db).await?)
}
