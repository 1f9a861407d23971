pub use sea_orm_migration::prelude::*;

mod m20261015_000001_create_schema;
mod m20261015_000002_create_users_and_social_accounts;
mod m20261015_000003_create_oauth_states;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261015_000001_create_schema::Migration),
            Box::new(m20261015_000002_create_users_and_social_accounts::Migration),
            Box::new(m20261015_000003_create_oauth_states::Migration),
        ]
    }
}
