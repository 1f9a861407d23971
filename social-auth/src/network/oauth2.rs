//! Settings-driven OAuth 2.0 authorization code network.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::{CallbackParams, Network, Profile};
use crate::error::{
    authentication_error, http_error, AuthenticationErrorKind, Error,
    ErrorKind, HttpErrorKind, SettingsErrorKind,
};
use crate::http::Transport;
use crate::settings::{ProviderSettings, SettingKey};

/// Network for providers following the plain authorization code grant.
///
/// Everything provider specific comes from settings:
/// - `authentication_url`, `api_key`, `redirect_uri`, `permissions` build the redirect
/// - `token_url`, `secret` drive the code exchange
/// - `api_url` + `profile_uri` locate the profile
pub struct OAuth2Network {
    name: String,
    settings: Arc<dyn ProviderSettings>,
    transport: Arc<dyn Transport>,
}

impl OAuth2Network {
    pub fn new(
        name: &str,
        settings: Arc<dyn ProviderSettings>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            name: name.to_string(),
            settings,
            transport,
        }
    }

    fn profile_url(&self) -> Result<String, Error> {
        let api_url = self.settings(SettingKey::ApiUrl)?;
        let profile_uri = self.settings(SettingKey::ProfileUri)?;
        Ok(format!(
            "{}/{}",
            api_url.trim_end_matches('/'),
            profile_uri.trim_start_matches('/')
        ))
    }
}

#[async_trait]
impl Network for OAuth2Network {
    fn name(&self) -> &str {
        &self.name
    }

    fn settings(&self, key: SettingKey) -> Result<String, Error> {
        self.settings.get(&self.name, key)
    }

    fn authentication_url(&self) -> Result<String, Error> {
        let endpoint = self.settings(SettingKey::AuthenticationUrl)?;
        let mut url = Url::parse(&endpoint).map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: ErrorKind::Settings(SettingsErrorKind::Invalid),
        })?;

        let client_id = self.settings(SettingKey::ApiKey)?;
        let redirect_uri = self.settings(SettingKey::RedirectUri)?;
        let permissions = self.settings(SettingKey::Permissions)?;

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &client_id)
                .append_pair("redirect_uri", &redirect_uri)
                .append_pair("response_type", "code");
            if !permissions.is_empty() {
                query.append_pair("scope", &permissions);
            }
        }

        Ok(url.into())
    }

    async fn authentication_callback(
        &self,
        params: &CallbackParams,
    ) -> Result<SecretString, Error> {
        if let Some(error) = params.get("error") {
            let reason = params.get("error_description").unwrap_or(error);
            warn!("{} denied authorization: {}", self.name, reason);
            return Err(authentication_error(
                AuthenticationErrorKind::ExchangeFailed,
                reason,
            ));
        }

        let code = params
            .get("code")
            .filter(|code| !code.is_empty())
            .ok_or_else(|| {
                authentication_error(
                    AuthenticationErrorKind::ExchangeFailed,
                    "authorization code not found",
                )
            })?;

        let token_url = self.settings(SettingKey::TokenUrl)?;
        let client_id = self.settings(SettingKey::ApiKey)?;
        let client_secret = self.settings(SettingKey::Secret)?;
        let redirect_uri = self.settings(SettingKey::RedirectUri)?;

        debug!("Exchanging {} authorization code for an access token", self.name);

        let response = self
            .transport
            .post_form(
                &token_url,
                &[
                    ("client_id", client_id.as_str()),
                    ("client_secret", client_secret.as_str()),
                    ("redirect_uri", redirect_uri.as_str()),
                    ("code", code.as_str()),
                    ("grant_type", "authorization_code"),
                ],
            )
            .await?;

        if !response.is_success() {
            warn!(
                "{} token endpoint answered {}: {}",
                self.name, response.status, response.body
            );
            return Err(authentication_error(
                AuthenticationErrorKind::ExchangeFailed,
                &format!("token endpoint answered {}", response.status),
            ));
        }

        parse_access_token(&response.body).map(SecretString::from)
    }

    async fn profile(&self, access_token: &SecretString) -> Result<Option<Profile>, Error> {
        let url = self.profile_url()?;
        let response = self
            .transport
            .get(&url, &[], Some(access_token.expose_secret()))
            .await?;

        if !response.is_success() {
            warn!(
                "{} profile endpoint answered {}: {}",
                self.name, response.status, response.body
            );
            return Err(http_error(
                HttpErrorKind::UnexpectedStatus,
                &format!("profile endpoint answered {}", response.status),
            ));
        }

        let value: Value = serde_json::from_str(&response.body).map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: ErrorKind::InvalidProfile,
        })?;

        Profile::from_json(value, access_token.clone())
    }
}

/// Extract the access token from a token endpoint response body.
///
/// Providers answer either with JSON or with a form-encoded body
/// (`access_token=...&expires=...`).
fn parse_access_token(body: &str) -> Result<String, Error> {
    if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body) {
        if let Some(token) = fields
            .get("access_token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
        {
            return Ok(token.to_string());
        }
        let reason = fields
            .get("error_description")
            .or_else(|| fields.get("error"))
            .and_then(Value::as_str)
            .unwrap_or("token response carries no access_token");
        return Err(authentication_error(
            AuthenticationErrorKind::ExchangeFailed,
            reason,
        ));
    }

    let pairs: HashMap<String, String> = url::form_urlencoded::parse(body.as_bytes())
        .into_owned()
        .collect();
    match pairs.get("access_token").filter(|token| !token.is_empty()) {
        Some(token) => Ok(token.clone()),
        None => {
            let reason = pairs
                .get("error_description")
                .or_else(|| pairs.get("error"))
                .map(String::as_str)
                .unwrap_or("token response carries no access_token");
            Err(authentication_error(
                AuthenticationErrorKind::ExchangeFailed,
                reason,
            ))
        }
    }
}
