use super::error::{EntityApiErrorKind, Error};
use chrono::Utc;
use entity::social_accounts;
use entity::users::{ActiveModel, Column, Entity, Model};
use log::*;
use sea_orm::{entity::prelude::*, sea_query::OnConflict, ConnectionTrait, Set, TransactionTrait};

/// Inserts a user, keeping the caller's id.
///
/// An existing user with the same email is left untouched and the insert fails
/// with `RecordAlreadyExists`.
pub async fn create(db: &impl ConnectionTrait, user_model: Model) -> Result<Model, Error> {
    debug!("New User Model to be inserted: {}", user_model.email);

    let now = Utc::now();
    let user = Model {
        created_at: now.into(),
        updated_at: now.into(),
        ..user_model
    };
    let user_active_model = ActiveModel {
        id: Set(user.id),
        email: Set(user.email.clone()),
        name: Set(user.name.clone()),
        profile: Set(user.profile.clone()),
        created_at: Set(user.created_at),
        updated_at: Set(user.updated_at),
    };

    let inserted = Entity::insert(user_active_model)
        .on_conflict(OnConflict::column(Column::Email).do_nothing().to_owned())
        .exec_without_returning(db)
        .await?;

    if inserted == 0 {
        warn!("A user with email {} already exists", user.email);
        return Err(Error {
            source: None,
            error_kind: EntityApiErrorKind::RecordAlreadyExists,
        });
    }

    Ok(user)
}

/// Creates a user together with the social account it signed in with.
///
/// Both rows are written in one transaction; an email that already belongs to a
/// user rolls back the whole creation.
pub async fn create_with_social_account(
    db: &impl TransactionTrait,
    user_model: Model,
    account_model: social_accounts::Model,
) -> Result<(Model, social_accounts::Model), Error> {
    let txn = db.begin().await?;

    let user = create(&txn, user_model).await?;
    let account = super::social_account::create(
        &txn,
        social_accounts::Model {
            user_id: user.id,
            ..account_model
        },
    )
    .await?;

    txn.commit().await?;

    Ok((user, account))
}

pub async fn find_by_email(db: &impl ConnectionTrait, email: &str) -> Result<Option<Model>, Error> {
    Ok(Entity::find().filter(Column::Email.eq(email)).one(db).await?)
}
