//! Social sign-in wired to the application's configuration and database.

use std::sync::Arc;
use std::time::Duration;

use log::*;
use sea_orm::DatabaseConnection;
use service::config::Config;
use social_auth::{
    cipher::TokenCipher,
    flow::{AuthFlow, CallbackOutcome, RedirectTarget},
    http::{HttpClientBuilder, HttpTransport},
    network::{CallbackParams, NetworkRegistry},
    settings::SettingsRegistry,
};

use crate::error::{DomainErrorKind, Error, InternalErrorKind};
use crate::state_store::DbStateStore;
use crate::user_store::DbUserStore;

/// The handshake backed by the `oauth_states`, `users` and `social_accounts` tables.
pub type DbAuthFlow = AuthFlow<Arc<DbStateStore>, DbUserStore>;

/// Build the provider registry from the configured settings file.
pub fn networks(config: &Config) -> Result<NetworkRegistry, Error> {
    let settings = SettingsRegistry::from_file(config.social_providers_config())?;
    debug!(
        "Loaded settings for providers: {}",
        settings.provider_names().join(", ")
    );

    let client = HttpClientBuilder::new()
        .with_timeout(Duration::from_secs(config.http_timeout_secs))
        .with_max_retries(config.http_max_retries)
        .build()
        .map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                "Failed to build provider HTTP client".to_string(),
            )),
        })?;

    Ok(NetworkRegistry::new(
        Arc::new(settings),
        Arc::new(HttpTransport::new(client)),
    ))
}

/// Build the token cipher from the configured encryption key.
pub fn token_cipher(config: &Config) -> Result<TokenCipher, Error> {
    let key = config.encryption_key().ok_or_else(|| Error {
        source: Some("ENCRYPTION_KEY is required to store access tokens".into()),
        error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
    })?;
    Ok(TokenCipher::from_hex(key)?)
}

/// Assemble the database-backed handshake.
pub fn auth_flow(config: &Config, db: Arc<DatabaseConnection>) -> Result<DbAuthFlow, Error> {
    let cipher = token_cipher(config)?;
    let state_store = Arc::new(DbStateStore::new(Arc::clone(&db), cipher.clone()));
    let user_store = DbUserStore::new(db, cipher);

    Ok(with_config(
        AuthFlow::new(networks(config)?, state_store, user_store),
        config,
    ))
}

/// Apply the configured state lifetime and key prefix to a flow.
pub fn with_config<S, U>(flow: AuthFlow<S, U>, config: &Config) -> AuthFlow<S, U>
where
    S: social_auth::state::StateStore,
    U: social_auth::reconcile::UserStore,
{
    flow.with_state_ttl(chrono::Duration::minutes(config.state_ttl_minutes))
        .with_state_key_prefix(config.state_key_prefix())
}

/// Start signing in with `provider`.
pub async fn initiate<S, U>(flow: &AuthFlow<S, U>, provider: &str) -> Result<RedirectTarget, Error>
where
    S: social_auth::state::StateStore,
    U: social_auth::reconcile::UserStore,
{
    let target = flow.initiate(provider).await?;
    info!("Redirecting to {provider} for sign-in");
    Ok(target)
}

/// Finish signing in with `provider` from its callback query parameters.
pub async fn callback<S, U>(
    flow: &AuthFlow<S, U>,
    provider: &str,
    params: &CallbackParams,
) -> Result<CallbackOutcome, Error>
where
    S: social_auth::state::StateStore,
    U: social_auth::reconcile::UserStore,
{
    flow.callback(provider, params).await.map_err(|e| {
        warn!("{provider} sign-in failed: {e}");
        Error::from(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExternalErrorKind;
    use clap::Parser;
    use serde_json::json;
    use social_auth::error::AuthenticationErrorKind;
    use social_auth::reconcile::MemoryUserStore;
    use social_auth::state::MemoryStateStore;
    use std::path::PathBuf;

    const TEST_KEY: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    fn write_settings(name: &str, base_url: &str) -> PathBuf {
        let settings = json!({
            "github": {
                "api_key": "someApiKey",
                "secret": "Cannot tell ya",
                "redirect_uri": "https://app.example.com/auth/github/callback",
                "authentication_url": format!("{base_url}/login/oauth/authorize"),
                "token_url": format!("{base_url}/login/oauth/access_token"),
                "api_url": base_url,
                "profile_uri": "/user",
                "permissions": "read:user user:email"
            }
        });
        let path = std::env::temp_dir().join(format!(
            "social_providers_{}_{}.json",
            name,
            std::process::id()
        ));
        std::fs::write(&path, settings.to_string()).unwrap();
        path
    }

    fn config(settings: &PathBuf) -> Config {
        Config::parse_from([
            "social_auth_rs",
            "--social-providers-config",
            settings.to_str().unwrap(),
            "--encryption-key",
            TEST_KEY,
        ])
    }

    #[test]
    fn token_cipher_requires_a_key() {
        let config = Config::parse_from(["social_auth_rs"]);
        let err = token_cipher(&config).unwrap_err();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Config)
        );
    }

    #[test]
    fn networks_fail_on_missing_settings_file() {
        let config = config(&PathBuf::from("/nonexistent/social_providers.json"));
        let err = networks(&config).err().unwrap();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Config)
        );
    }

    #[tokio::test]
    async fn configured_flow_signs_in_against_provider() {
        let mut server = mockito::Server::new_async().await;
        let token_mock = server
            .mock("POST", "/login/oauth/access_token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"tok123","token_type":"bearer"}"#)
            .expect(1)
            .create_async()
            .await;
        let profile_mock = server
            .mock("GET", "/user")
            .match_header("authorization", "Bearer tok123")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":99,"email":"a@b.com","name":"Ada"}"#)
            .create_async()
            .await;

        let settings = write_settings("sign_in", &server.url());
        let config = config(&settings);
        let users = Arc::new(MemoryUserStore::new());
        let flow = with_config(
            AuthFlow::new(
                networks(&config).unwrap(),
                MemoryStateStore::new(),
                Arc::clone(&users),
            ),
            &config,
        );

        let target = initiate(&flow, "github").await.unwrap();
        assert!(target.url.contains("client_id=someApiKey"));
        assert!(target.url.contains(&format!("state={}", target.state)));

        let params: CallbackParams = [
            ("state".to_string(), target.state.to_string()),
            ("code".to_string(), "abc".to_string()),
        ]
        .into_iter()
        .collect();
        let outcome = callback(&flow, "github", &params).await.unwrap();
        assert_eq!(outcome.state, target.state);

        let accounts = users.social_accounts().await;
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].account_id, "99");

        token_mock.assert_async().await;
        profile_mock.assert_async().await;
        std::fs::remove_file(settings).ok();
    }

    #[tokio::test]
    async fn provider_refusal_surfaces_as_exchange_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/login/oauth/access_token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"bad_verification_code"}"#)
            .create_async()
            .await;

        let settings = write_settings("refusal", &server.url());
        let config = config(&settings);
        let flow = AuthFlow::new(
            networks(&config).unwrap(),
            MemoryStateStore::new(),
            MemoryUserStore::new(),
        );

        let target = initiate(&flow, "github").await.unwrap();
        let params: CallbackParams = [
            ("state".to_string(), target.state.to_string()),
            ("code".to_string(), "stale".to_string()),
        ]
        .into_iter()
        .collect();

        let err = callback(&flow, "github", &params).await.unwrap_err();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Authentication(AuthenticationErrorKind::ExchangeFailed)
        );
        std::fs::remove_file(settings).ok();
    }

    #[tokio::test]
    async fn profile_without_email_is_an_invalid_profile() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/login/oauth/access_token")
            .with_status(200)
            .with_body("access_token=tok123&expires=5183999")
            .create_async()
            .await;
        server
            .mock("GET", "/user")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"123"}"#)
            .create_async()
            .await;

        let settings = write_settings("no_email", &server.url());
        let config = config(&settings);
        let flow = AuthFlow::new(
            networks(&config).unwrap(),
            MemoryStateStore::new(),
            MemoryUserStore::new(),
        );

        let target = initiate(&flow, "github").await.unwrap();
        let params: CallbackParams = [
            ("state".to_string(), target.state.to_string()),
            ("code".to_string(), "abc".to_string()),
        ]
        .into_iter()
        .collect();

        let err = callback(&flow, "github", &params).await.unwrap_err();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::External(ExternalErrorKind::InvalidProfile)
        );
        std::fs::remove_file(settings).ok();
    }
}
