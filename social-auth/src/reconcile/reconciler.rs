//! Reconciliation policy: find or create the local user behind a remote profile.

use secrecy::ExposeSecret;
use tracing::{debug, info};

use super::{LocalUser, NewSocialAccount, NewUser, UserStore};
use crate::error::{invalid_profile_error, storage_error, Error, ErrorKind, StorageErrorKind};
use crate::network::Profile;

/// Outcome of reconciling a profile.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    /// A user with the profile's email already existed and was left untouched.
    Existing(LocalUser),
    /// A new user was created and linked to the provider account.
    Created(LocalUser),
}

impl Reconciliation {
    pub fn user(&self) -> &LocalUser {
        match self {
            Reconciliation::Existing(user) | Reconciliation::Created(user) => user,
        }
    }
}

/// Maps remote profiles onto local users, keyed by email.
///
/// An email that already belongs to a local user is a no-op: the user is not
/// updated and no social account is linked for the new provider. Linking
/// additional providers to an existing user is outside this policy.
pub struct UserReconciler<U: UserStore> {
    store: U,
}

impl<U: UserStore> UserReconciler<U> {
    pub fn new(store: U) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &U {
        &self.store
    }

    /// Reconcile `profile`, obtained from the `network` provider.
    ///
    /// Fails with `InvalidProfile` when the profile is absent or has no email, or
    /// when a new user would be created from a profile without an id.
    pub async fn reconcile(
        &self,
        network: &str,
        profile: Option<Profile>,
    ) -> Result<Reconciliation, Error> {
        let profile = profile.ok_or_else(|| invalid_profile_error("profile is absent"))?;
        let email = profile
            .email
            .clone()
            .ok_or_else(|| invalid_profile_error("profile has no email"))?;

        if let Some(user) = self.store.find_user_by_email(&email).await? {
            debug!("{} profile matches existing user {}", network, user.id);
            return Ok(Reconciliation::Existing(user));
        }

        let account_id = profile
            .id
            .clone()
            .ok_or_else(|| invalid_profile_error("profile has no id"))?;

        let new_user = NewUser {
            email: email.clone(),
            name: profile.name.clone(),
            profile: profile.fields.clone(),
        };
        let account = NewSocialAccount {
            network: network.to_string(),
            account_id,
            access_token: profile.access_token.expose_secret().clone(),
        };

        match self.store.create_with_social_account(new_user, account).await {
            Ok(user) => {
                info!("Created user {} from {} profile", user.id, network);
                Ok(Reconciliation::Created(user))
            }
            // Lost a race against a concurrent reconciliation for the same email.
            Err(Error {
                error_kind: ErrorKind::Storage(StorageErrorKind::Conflict),
                ..
            }) => match self.store.find_user_by_email(&email).await? {
                Some(user) => Ok(Reconciliation::Existing(user)),
                None => Err(storage_error(
                    StorageErrorKind::User,
                    "user vanished after email conflict",
                )),
            },
            Err(e) => Err(e),
        }
    }
}
