//! Provider settings resolution.
//!
//! Settings are looked up by provider name and key. The registry shipped here is
//! loaded from a JSON document of the form
//! `{ "github": { "api_key": "...", "secret": "...", ... } }`.

use std::collections::HashMap;
use std::path::Path;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::{settings_error, unknown_provider_error, Error, ErrorKind, SettingsErrorKind};

/// Keys a provider's settings may be queried for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    ApiKey,
    Secret,
    RedirectUri,
    AuthenticationUrl,
    TokenUrl,
    ApiUrl,
    ProfileUri,
    Permissions,
}

impl SettingKey {
    /// Get the key's identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::ApiKey => "api_key",
            SettingKey::Secret => "secret",
            SettingKey::RedirectUri => "redirect_uri",
            SettingKey::AuthenticationUrl => "authentication_url",
            SettingKey::TokenUrl => "token_url",
            SettingKey::ApiUrl => "api_url",
            SettingKey::ProfileUri => "profile_uri",
            SettingKey::Permissions => "permissions",
        }
    }
}

/// Resolves configuration values for a named provider.
pub trait ProviderSettings: Send + Sync {
    /// Returns true if settings exist for `provider`.
    fn has_provider(&self, provider: &str) -> bool;

    /// Get a single setting value.
    ///
    /// Fails with `UnknownProvider` when the provider has no settings and with
    /// `Settings(MissingKey)` when the key is not configured.
    fn get(&self, provider: &str, key: SettingKey) -> Result<String, Error>;
}

/// Settings of one provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// OAuth client id.
    pub api_key: String,
    /// OAuth client secret.
    pub secret: SecretString,
    pub redirect_uri: String,
    /// Authorization endpoint the user is redirected to.
    pub authentication_url: String,
    pub token_url: String,
    pub api_url: String,
    pub profile_uri: String,
    /// Requested scopes, in the provider's own separator convention.
    #[serde(default)]
    pub permissions: String,
}

impl ProviderConfig {
    fn value(&self, key: SettingKey) -> &str {
        match key {
            SettingKey::ApiKey => &self.api_key,
            SettingKey::Secret => self.secret.expose_secret(),
            SettingKey::RedirectUri => &self.redirect_uri,
            SettingKey::AuthenticationUrl => &self.authentication_url,
            SettingKey::TokenUrl => &self.token_url,
            SettingKey::ApiUrl => &self.api_url,
            SettingKey::ProfileUri => &self.profile_uri,
            SettingKey::Permissions => &self.permissions,
        }
    }
}

/// In-memory provider settings keyed by provider name.
#[derive(Debug, Clone, Default)]
pub struct SettingsRegistry {
    providers: HashMap<String, ProviderConfig>,
}

impl SettingsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the settings of a provider.
    pub fn with_provider(mut self, name: &str, config: ProviderConfig) -> Self {
        self.providers.insert(name.to_string(), config);
        self
    }

    /// Parse a JSON document mapping provider names to their settings.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let providers: HashMap<String, ProviderConfig> =
            serde_json::from_str(json).map_err(|e| Error {
                source: Some(Box::new(e)),
                error_kind: ErrorKind::Settings(SettingsErrorKind::Invalid),
            })?;
        Ok(Self { providers })
    }

    /// Read and parse a JSON settings file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: ErrorKind::Settings(SettingsErrorKind::Unreadable),
        })?;
        Self::from_json(&json)
    }

    /// Names of all configured providers.
    pub fn provider_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl ProviderSettings for SettingsRegistry {
    fn has_provider(&self, provider: &str) -> bool {
        self.providers.contains_key(provider)
    }

    fn get(&self, provider: &str, key: SettingKey) -> Result<String, Error> {
        let config = self
            .providers
            .get(provider)
            .ok_or_else(|| unknown_provider_error(provider))?;

        let value = config.value(key);
        if value.is_empty() && key != SettingKey::Permissions {
            return Err(settings_error(
                SettingsErrorKind::MissingKey,
                &format!("{} is not configured for {}", key.as_str(), provider),
            ));
        }
        Ok(value.to_string())
    }
}
