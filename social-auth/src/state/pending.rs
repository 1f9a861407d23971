//! Pending authentication records.

use serde::{Deserialize, Serialize};

/// Record kept under a state token for the lifetime of one handshake.
///
/// A record without an access token is still in flight. Once a callback
/// succeeds the access token is attached and the record is considered completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAuth {
    /// Client id of the provider the handshake was started against.
    pub api_key: String,
    pub redirect_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl PendingAuth {
    pub fn new(api_key: String, redirect_uri: String) -> Self {
        Self {
            api_key,
            redirect_uri,
            access_token: None,
        }
    }

    /// True once a callback has attached an access token.
    pub fn is_completed(&self) -> bool {
        self.access_token.is_some()
    }

    /// Consume the record, returning it with the access token attached.
    pub fn complete(mut self, access_token: String) -> Self {
        self.access_token = Some(access_token);
        self
    }
}
