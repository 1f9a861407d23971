//! In-memory user store.

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{LocalUser, NewSocialAccount, NewUser, SocialAccount, UserStore};
use crate::error::{storage_error, Error, StorageErrorKind};

#[derive(Debug, Default)]
struct Records {
    users: Vec<LocalUser>,
    accounts: Vec<SocialAccount>,
}

/// [`UserStore`] keeping users and accounts in process memory.
///
/// A single lock covers both collections, which makes user plus account creation atomic.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    records: Mutex<Records>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All users, in creation order.
    pub async fn users(&self) -> Vec<LocalUser> {
        self.records.lock().await.users.clone()
    }

    /// All social accounts, in creation order.
    pub async fn social_accounts(&self) -> Vec<SocialAccount> {
        self.records.lock().await.accounts.clone()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<LocalUser>, Error> {
        let records = self.records.lock().await;
        Ok(records.users.iter().find(|user| user.email == email).cloned())
    }

    async fn create_with_social_account(
        &self,
        user: NewUser,
        account: NewSocialAccount,
    ) -> Result<LocalUser, Error> {
        let mut records = self.records.lock().await;
        if records.users.iter().any(|existing| existing.email == user.email) {
            return Err(storage_error(
                StorageErrorKind::Conflict,
                "a user with this email already exists",
            ));
        }

        let created = LocalUser {
            id: Uuid::new_v4(),
            email: user.email,
            name: user.name,
        };
        records.accounts.push(SocialAccount {
            id: Uuid::new_v4(),
            user_id: created.id,
            network: account.network,
            account_id: account.account_id,
            access_token: account.access_token,
        });
        records.users.push(created.clone());
        Ok(created)
    }
}
