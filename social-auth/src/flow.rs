//! The two-phase authorization code handshake.
//!
//! `initiate` issues a state token, records the pending authentication and
//! returns where to send the user. `callback` validates the returned state,
//! exchanges the code, records the access token and reconciles the profile.

use chrono::Duration;
use secrecy::ExposeSecret;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{
    authentication_error, AuthenticationErrorKind, Error, ErrorKind, SettingsErrorKind,
    STATE_MISSING_DETAIL, STATE_TIMEOUT_DETAIL,
};
use crate::network::{CallbackParams, NetworkRegistry};
use crate::reconcile::{Reconciliation, UserReconciler, UserStore};
use crate::settings::SettingKey;
use crate::state::{
    PendingAuth, StateStore, StateToken, DEFAULT_STATE_KEY_PREFIX, DEFAULT_STATE_TTL_MINUTES,
};

/// Where the caller must redirect the user to continue the handshake.
#[derive(Debug, Clone, PartialEq)]
pub struct RedirectTarget {
    /// Provider authorization URL, `state` parameter included.
    pub url: String,
    pub state: StateToken,
}

/// Result of a successful callback.
///
/// Session data lives in the state store under the returned token.
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackOutcome {
    pub state: StateToken,
}

/// Orchestrates the authorization code handshake for any registered provider.
pub struct AuthFlow<S: StateStore, U: UserStore> {
    networks: NetworkRegistry,
    state_store: S,
    reconciler: UserReconciler<U>,
    state: Option<StateToken>,
    state_ttl: Duration,
    state_key_prefix: String,
}

impl<S: StateStore, U: UserStore> AuthFlow<S, U> {
    pub fn new(networks: NetworkRegistry, state_store: S, user_store: U) -> Self {
        Self {
            networks,
            state_store,
            reconciler: UserReconciler::new(user_store),
            state: None,
            state_ttl: Duration::minutes(DEFAULT_STATE_TTL_MINUTES),
            state_key_prefix: DEFAULT_STATE_KEY_PREFIX.to_string(),
        }
    }

    /// Use `state` instead of generating a token on `initiate`.
    ///
    /// Meant for tests and debugging only: a fixed token is guessable.
    pub fn with_state(mut self, state: StateToken) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_state_ttl(mut self, ttl: Duration) -> Self {
        self.state_ttl = ttl;
        self
    }

    pub fn with_state_key_prefix(mut self, prefix: &str) -> Self {
        self.state_key_prefix = prefix.to_string();
        self
    }

    pub fn state_store(&self) -> &S {
        &self.state_store
    }

    pub fn user_store(&self) -> &U {
        self.reconciler.store()
    }

    /// The state store key of `state`.
    pub fn state_key(&self, state: &StateToken) -> String {
        state.store_key(&self.state_key_prefix)
    }

    /// Start a handshake with `provider`.
    ///
    /// The pending authentication is stored before the redirect target is returned,
    /// so a callback arriving right after the redirect always finds its state.
    pub async fn initiate(&self, provider: &str) -> Result<RedirectTarget, Error> {
        let network = self.networks.network(provider)?;
        let state = self.state.clone().unwrap_or_else(StateToken::generate);

        let api_key = network.settings(SettingKey::ApiKey)?;
        let redirect_uri = network.settings(SettingKey::RedirectUri)?;
        let url = append_state(&network.authentication_url()?, &state)?;

        self.state_store
            .put(
                &self.state_key(&state),
                PendingAuth::new(api_key, redirect_uri),
                self.state_ttl,
            )
            .await?;

        debug!("Issued {} state, expiring in {}", provider, self.state_ttl);
        Ok(RedirectTarget { url, state })
    }

    /// Complete a handshake from the query parameters `provider` called back with.
    ///
    /// Nothing is retried. A failure at any step fails the whole callback; a pending
    /// authentication left without an access token is indistinguishable from one
    /// still in flight.
    pub async fn callback(
        &self,
        provider: &str,
        params: &CallbackParams,
    ) -> Result<CallbackOutcome, Error> {
        let network = self.networks.network(provider)?;

        let state = params
            .get("state")
            .filter(|state| !state.is_empty())
            .map(|state| StateToken::from_string(state.clone()))
            .ok_or_else(|| {
                warn!("{} callback without state", provider);
                authentication_error(AuthenticationErrorKind::StateMissing, STATE_MISSING_DETAIL)
            })?;
        let key = self.state_key(&state);

        let pending = self.live_pending(&key, provider).await?;
        if pending.is_completed() {
            warn!("{} callback replayed a completed state", provider);
            return Err(authentication_error(
                AuthenticationErrorKind::StateConsumed,
                "authentication already completed for this state",
            ));
        }

        let access_token = network
            .authentication_callback(params)
            .await
            .map_err(|e| {
                warn!("{} code exchange failed: {}", provider, e);
                into_exchange_failure(e)
            })?;

        // The token is recorded before the profile is fetched; a later failure
        // leaves it in place.
        let pending = self.live_pending(&key, provider).await?;
        self.state_store
            .put(
                &key,
                pending.complete(access_token.expose_secret().clone()),
                self.state_ttl,
            )
            .await?;

        let profile = network.profile(&access_token).await?;
        let reconciliation = self.reconciler.reconcile(network.name(), profile).await?;
        if let Reconciliation::Created(user) = &reconciliation {
            info!("{} sign-in created user {}", provider, user.id);
        }

        Ok(CallbackOutcome { state })
    }

    async fn live_pending(&self, key: &str, provider: &str) -> Result<PendingAuth, Error> {
        self.state_store.get(key).await?.ok_or_else(|| {
            warn!("{} callback with expired or unknown state", provider);
            authentication_error(AuthenticationErrorKind::StateTimeout, STATE_TIMEOUT_DETAIL)
        })
    }
}

fn append_state(authentication_url: &str, state: &StateToken) -> Result<String, Error> {
    let mut url = Url::parse(authentication_url).map_err(|e| Error {
        source: Some(Box::new(e)),
        error_kind: ErrorKind::Settings(SettingsErrorKind::Invalid),
    })?;
    url.query_pairs_mut().append_pair("state", state.as_str());
    Ok(url.into())
}

fn into_exchange_failure(err: Error) -> Error {
    if err.error_kind == ErrorKind::Authentication(AuthenticationErrorKind::ExchangeFailed) {
        return err;
    }
    Error {
        source: Some(Box::new(err)),
        error_kind: ErrorKind::Authentication(AuthenticationErrorKind::ExchangeFailed),
    }
}
