//! Persistence contract for local users and their social accounts.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::Error;

/// A persisted local identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalUser {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
}

/// Fields of a user about to be created from a remote profile.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub name: Option<String>,
    /// The provider's full profile response.
    pub profile: Map<String, Value>,
}

/// Link between a local user and their account at a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSocialAccount {
    /// Provider name, e.g. "github".
    pub network: String,
    /// The user's id at the provider.
    pub account_id: String,
    pub access_token: String,
}

/// A persisted social account.
#[derive(Debug, Clone, PartialEq)]
pub struct SocialAccount {
    pub id: Uuid,
    pub user_id: Uuid,
    pub network: String,
    pub account_id: String,
    pub access_token: String,
}

/// Trait for persisting users reconciled from remote profiles.
///
/// `create_with_social_account` is one logical unit: implementations must either
/// persist both records or neither, so no user is left without its account.
/// Email is the natural key; a second user with the same email must be refused
/// with `Storage(Conflict)`.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user by exact email match.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<LocalUser>, Error>;

    /// Create a user together with its first social account.
    async fn create_with_social_account(
        &self,
        user: NewUser,
        account: NewSocialAccount,
    ) -> Result<LocalUser, Error>;
}

#[async_trait]
impl<T: UserStore + ?Sized> UserStore for Arc<T> {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<LocalUser>, Error> {
        (**self).find_user_by_email(email).await
    }

    async fn create_with_social_account(
        &self,
        user: NewUser,
        account: NewSocialAccount,
    ) -> Result<LocalUser, Error> {
        (**self).create_with_social_account(user, account).await
    }
}
