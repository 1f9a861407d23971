use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Pending authentications keyed by their namespaced state key.
        // Rows past expires_at are ignored by readers and removed by purging.
        let create_table_sql = r#"
            CREATE TABLE IF NOT EXISTS social_auth.oauth_states (
                key VARCHAR(255) PRIMARY KEY,
                payload JSONB NOT NULL,
                expires_at TIMESTAMPTZ NOT NULL,

                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
        "#;

        manager
            .get_connection()
            .execute_unprepared(create_table_sql)
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                "CREATE INDEX IF NOT EXISTS idx_oauth_states_expires_at
                 ON social_auth.oauth_states(expires_at)",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS social_auth.oauth_states")
            .await?;

        Ok(())
    }
}
