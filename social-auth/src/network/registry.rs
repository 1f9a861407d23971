//! Provider registry mapping names to network constructors.

use std::collections::HashMap;
use std::sync::Arc;

use super::{Network, OAuth2Network};
use crate::error::{unknown_provider_error, Error};
use crate::http::Transport;
use crate::settings::ProviderSettings;

/// Builds the network for a provider name.
pub type NetworkConstructor = Arc<
    dyn Fn(&str, Arc<dyn ProviderSettings>, Arc<dyn Transport>) -> Box<dyn Network> + Send + Sync,
>;

/// Resolves provider names to [`Network`] instances.
///
/// Every provider with settings gets an [`OAuth2Network`] unless a dedicated
/// constructor was registered for its name.
#[derive(Clone)]
pub struct NetworkRegistry {
    settings: Arc<dyn ProviderSettings>,
    transport: Arc<dyn Transport>,
    constructors: HashMap<String, NetworkConstructor>,
}

impl NetworkRegistry {
    pub fn new(settings: Arc<dyn ProviderSettings>, transport: Arc<dyn Transport>) -> Self {
        Self {
            settings,
            transport,
            constructors: HashMap::new(),
        }
    }

    /// Register a dedicated constructor for `provider`.
    pub fn register<F>(mut self, provider: &str, constructor: F) -> Self
    where
        F: Fn(&str, Arc<dyn ProviderSettings>, Arc<dyn Transport>) -> Box<dyn Network>
            + Send
            + Sync
            + 'static,
    {
        self.constructors
            .insert(provider.to_string(), Arc::new(constructor));
        self
    }

    /// Build the network for `provider`.
    ///
    /// Fails with `UnknownProvider` if the name is empty or has no settings.
    pub fn network(&self, provider: &str) -> Result<Box<dyn Network>, Error> {
        if provider.is_empty() || !self.settings.has_provider(provider) {
            return Err(unknown_provider_error(provider));
        }

        let settings = Arc::clone(&self.settings);
        let transport = Arc::clone(&self.transport);
        let network = match self.constructors.get(provider) {
            Some(constructor) => constructor(provider, settings, transport),
            None => Box::new(OAuth2Network::new(provider, settings, transport)),
        };
        Ok(network)
    }
}
