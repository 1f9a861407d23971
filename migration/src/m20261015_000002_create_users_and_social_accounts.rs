use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// Email is the reconciliation key; the unique constraint is what makes
// concurrent sign-ins for one email create a single user.
const CREATE_USERS_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS social_auth.users (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        email VARCHAR(255) NOT NULL UNIQUE,
        name VARCHAR(255),
        profile JSONB NOT NULL DEFAULT '{}'::jsonb,

        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
"#;

// A provider account is not unique here: once its email changes at the provider,
// the next sign-in creates a new user with a second row for the same account.
// Tokens are encrypted at the application layer (AES-256-GCM).
const CREATE_SOCIAL_ACCOUNTS_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS social_auth.social_accounts (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        user_id UUID NOT NULL REFERENCES social_auth.users(id) ON DELETE CASCADE,

        network VARCHAR(64) NOT NULL,
        account_id VARCHAR(255) NOT NULL,
        access_token TEXT NOT NULL,

        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
"#;

const CREATE_INDEXES_SQL: [&str; 2] = [
    "CREATE INDEX IF NOT EXISTS idx_social_accounts_user_id
     ON social_auth.social_accounts(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_social_accounts_network_account_id
     ON social_auth.social_accounts(network, account_id)",
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(CREATE_USERS_SQL).await?;
        db.execute_unprepared(CREATE_SOCIAL_ACCOUNTS_SQL).await?;
        for sql in CREATE_INDEXES_SQL {
            db.execute_unprepared(sql).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS social_auth.social_accounts")
            .await?;

        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS social_auth.users")
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_the_only_unique_user_key() {
        assert!(CREATE_USERS_SQL.contains("email VARCHAR(255) NOT NULL UNIQUE"));
    }

    #[test]
    fn provider_account_may_back_several_users() {
        assert!(!CREATE_SOCIAL_ACCOUNTS_SQL.contains("UNIQUE"));
        assert!(!CREATE_INDEXES_SQL
            .iter()
            .any(|sql| sql.contains("UNIQUE")));
        assert!(CREATE_INDEXES_SQL
            .iter()
            .any(|sql| sql.contains("(network, account_id)")));
    }
}
