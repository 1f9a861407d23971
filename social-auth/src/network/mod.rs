//! Provider networks: the client side of one provider's OAuth dialect.

mod oauth2;
mod profile;
mod registry;

use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::error::Error;
use crate::settings::SettingKey;

pub use oauth2::OAuth2Network;
pub use profile::Profile;
pub use registry::{NetworkConstructor, NetworkRegistry};

/// Query parameters a provider appended to the callback URL.
pub type CallbackParams = HashMap<String, String>;

/// Capabilities every provider network offers.
///
/// This is the seam for adding providers: `AuthFlow` only ever talks to a
/// `Network`, never to a concrete provider.
#[async_trait]
pub trait Network: Send + Sync {
    /// The provider name this network was built for.
    fn name(&self) -> &str;

    /// Look up one of this provider's settings.
    fn settings(&self, key: SettingKey) -> Result<String, Error>;

    /// Authorization URL the user is redirected to, without the `state` parameter.
    fn authentication_url(&self) -> Result<String, Error>;

    /// Trade the authorization code found in `params` for an access token.
    async fn authentication_callback(&self, params: &CallbackParams)
        -> Result<SecretString, Error>;

    /// Fetch the remote profile of the user owning `access_token`.
    ///
    /// `Ok(None)` means the provider answered but returned no profile.
    async fn profile(&self, access_token: &SecretString) -> Result<Option<Profile>, Error>;
}
