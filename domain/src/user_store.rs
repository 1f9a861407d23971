//! Database-backed user store.
//!
//! Implements `social_auth::reconcile::UserStore` over the `users` and
//! `social_accounts` tables. Social account access tokens are encrypted at rest.

use std::sync::Arc;

use async_trait::async_trait;
use log::*;
use sea_orm::DatabaseConnection;
use serde_json::Value;

use entity_api::{social_accounts, user, users, Id};
use social_auth::{
    cipher::TokenCipher,
    error::{Error, StorageErrorKind},
    reconcile::{LocalUser, NewSocialAccount, NewUser, UserStore},
};

use crate::error::storage_db_err;

pub struct DbUserStore {
    db: Arc<DatabaseConnection>,
    cipher: TokenCipher,
}

impl DbUserStore {
    pub fn new(db: Arc<DatabaseConnection>, cipher: TokenCipher) -> Self {
        Self { db, cipher }
    }
}

fn local_user(model: users::Model) -> LocalUser {
    LocalUser {
        id: model.id,
        email: model.email,
        name: model.name,
    }
}

#[async_trait]
impl UserStore for DbUserStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<LocalUser>, Error> {
        let found = user::find_by_email(self.db.as_ref(), email)
            .await
            .map_err(|e| storage_db_err(StorageErrorKind::User, e))?;
        Ok(found.map(local_user))
    }

    async fn create_with_social_account(
        &self,
        new_user: NewUser,
        account: NewSocialAccount,
    ) -> Result<LocalUser, Error> {
        let now = chrono::Utc::now();
        let user_model = users::Model {
            id: Id::new_v4(),
            email: new_user.email,
            name: new_user.name,
            profile: Value::Object(new_user.profile),
            created_at: now.into(),
            updated_at: now.into(),
        };
        let account_model = social_accounts::Model {
            id: Id::new_v4(),
            user_id: user_model.id,
            network: account.network,
            account_id: account.account_id,
            access_token: self.cipher.seal(&account.access_token)?,
            created_at: now.into(),
            updated_at: now.into(),
        };

        let (created, linked) =
            user::create_with_social_account(self.db.as_ref(), user_model, account_model)
                .await
                .map_err(|e| storage_db_err(StorageErrorKind::User, e))?;

        debug!(
            "Linked {} account {} to user {}",
            linked.network, linked.account_id, created.id
        );
        Ok(local_user(created))
    }
}

#[cfg(test)]
// We need to gate seaORM's mock feature behind conditional compilation because
// the feature removes the Clone trait implementation from seaORM's DatabaseConnection.
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use secrecy::SecretString;
    use serde_json::{json, Map};
    use social_auth::network::Profile;
    use social_auth::reconcile::{Reconciliation, UserReconciler};

    const TEST_KEY: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    fn cipher() -> TokenCipher {
        TokenCipher::from_hex(TEST_KEY).unwrap()
    }

    fn user_row(email: &str) -> users::Model {
        let now = chrono::Utc::now();
        users::Model {
            id: Id::new_v4(),
            email: email.to_string(),
            name: None,
            profile: json!({"id": "99", "email": email}),
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn account_row(user_id: Id, access_token: String) -> social_accounts::Model {
        let now = chrono::Utc::now();
        social_accounts::Model {
            id: Id::new_v4(),
            user_id,
            network: "github".to_string(),
            account_id: "99".to_string(),
            access_token,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn inserted(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            name: None,
            profile: Map::new(),
        }
    }

    fn github_account() -> NewSocialAccount {
        NewSocialAccount {
            network: "github".to_string(),
            account_id: "99".to_string(),
            access_token: "tok123".to_string(),
        }
    }

    fn github_profile(email: &str) -> Option<Profile> {
        Profile::from_json(
            json!({"id": "99", "email": email}),
            SecretString::new("tok123".to_string()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn find_user_by_email_maps_the_row() -> Result<(), Error> {
        let row = user_row("a@b.com");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[row.clone()]])
            .into_connection();
        let store = DbUserStore::new(Arc::new(db), cipher());

        let found = store.find_user_by_email("a@b.com").await?;
        assert_eq!(
            found,
            Some(LocalUser {
                id: row.id,
                email: "a@b.com".to_string(),
                name: None,
            })
        );
        Ok(())
    }

    #[tokio::test]
    async fn create_with_social_account_seals_the_token() -> Result<(), Error> {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([inserted(1)])
                .append_query_results([[account_row(Id::new_v4(), cipher().seal("tok123")?)]])
                .into_connection(),
        );
        let store = DbUserStore::new(Arc::clone(&db), cipher());

        let mut user = new_user("a@b.com");
        user.profile.insert("id".to_string(), json!("99"));
        let created = store
            .create_with_social_account(user, github_account())
            .await?;
        assert_eq!(created.email, "a@b.com");

        drop(store);
        let Ok(db) = Arc::try_unwrap(db) else {
            panic!("connection still shared");
        };
        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains(&created.id.to_string()));
        assert!(log.contains("github"));
        assert!(!log.contains("tok123"));
        Ok(())
    }

    #[tokio::test]
    async fn taken_email_is_a_storage_conflict() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([inserted(0)])
            .into_connection();
        let store = DbUserStore::new(Arc::new(db), cipher());

        let err = store
            .create_with_social_account(new_user("a@b.com"), github_account())
            .await
            .unwrap_err();
        assert_eq!(
            err.error_kind,
            social_auth::ErrorKind::Storage(StorageErrorKind::Conflict)
        );
    }

    #[tokio::test]
    async fn failed_insert_is_a_user_storage_error() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_errors([sea_orm::DbErr::Custom("connection reset".to_string())])
            .into_connection();
        let store = DbUserStore::new(Arc::new(db), cipher());

        let err = store
            .create_with_social_account(new_user("a@b.com"), github_account())
            .await
            .unwrap_err();
        assert_eq!(
            err.error_kind,
            social_auth::ErrorKind::Storage(StorageErrorKind::User)
        );
    }

    #[tokio::test]
    async fn reconciler_recovers_from_a_concurrent_creation() -> Result<(), Error> {
        let winner = user_row("a@b.com");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results::<users::Model, Vec<users::Model>, _>(vec![
                vec![],
                vec![winner.clone()],
            ])
            .append_exec_results([inserted(0)])
            .into_connection();
        let reconciler = UserReconciler::new(DbUserStore::new(Arc::new(db), cipher()));

        let outcome = reconciler
            .reconcile("github", github_profile("a@b.com"))
            .await?;

        assert_eq!(
            outcome,
            Reconciliation::Existing(LocalUser {
                id: winner.id,
                email: "a@b.com".to_string(),
                name: None,
            })
        );
        Ok(())
    }

    #[tokio::test]
    async fn account_with_a_changed_email_creates_a_new_user() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results::<users::Model, Vec<users::Model>, _>(vec![vec![]])
            .append_exec_results([inserted(1)])
            .append_query_results([[account_row(Id::new_v4(), cipher().seal("tok123")?)]])
            .into_connection();
        let reconciler = UserReconciler::new(DbUserStore::new(Arc::new(db), cipher()));

        let outcome = reconciler
            .reconcile("github", github_profile("new@b.com"))
            .await?;

        assert!(matches!(outcome, Reconciliation::Created(_)));
        assert_eq!(outcome.user().email, "new@b.com");
        Ok(())
    }
}
