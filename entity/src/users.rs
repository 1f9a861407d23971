//! SeaORM Entity for users created by social sign-in.

use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(schema_name = "social_auth", table_name = "users")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    pub id: Id,
    #[sea_orm(unique)]
    pub email: String,
    pub name: Option<String>,
    /// The remote profile the user was created from, as returned by the provider.
    pub profile: Json,
    #[serde(skip_deserializing)]
    pub created_at: DateTimeWithTimeZone,
    #[serde(skip_deserializing)]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::social_accounts::Entity")]
    SocialAccounts,
}

impl Related<super::social_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SocialAccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
