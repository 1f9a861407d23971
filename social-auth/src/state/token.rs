//! Opaque anti-forgery state tokens.

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Number of random bytes behind a generated token (256 bits).
const TOKEN_BYTES: usize = 32;

/// Opaque, unguessable value correlating a provider callback with the request
/// that started the handshake.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateToken(String);

impl StateToken {
    /// Generate a new token from the operating system's CSPRNG, URL-safe encoded.
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Wrap a token received from a caller or a callback.
    pub fn from_string(token: String) -> Self {
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The key this token is stored under, namespaced by `prefix`.
    pub fn store_key(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.0)
    }
}

impl fmt::Display for StateToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_is_url_safe_and_long_enough() {
        let token = StateToken::generate();
        // 32 bytes base64url without padding
        assert_eq!(token.as_str().len(), 43);
        assert!(token
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_generate_does_not_repeat() {
        let tokens: HashSet<StateToken> = (0..1000).map(|_| StateToken::generate()).collect();
        assert_eq!(tokens.len(), 1000);
    }

    #[test]
    fn test_store_key_is_namespaced() {
        let token = StateToken::from_string("aFakeState".to_string());
        assert_eq!(token.store_key("auth_social_state_"), "auth_social_state_aFakeState");
    }
}
