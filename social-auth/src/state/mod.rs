//! State-token lifecycle for the authorization code handshake.
//!
//! A state token is issued when a handshake starts, stored alongside a
//! [`PendingAuth`] record for a fixed TTL, and validated when the provider
//! calls back. Records are never deleted explicitly; expiry is the only cleanup.

mod pending;
mod store;
mod token;

pub use pending::PendingAuth;
pub use store::{MemoryStateStore, StateStore};
pub use token::StateToken;

/// Namespace prepended to every state token before it is used as a store key.
pub const DEFAULT_STATE_KEY_PREFIX: &str = "auth_social_state_";

/// Minutes a pending authentication stays valid after each write.
pub const DEFAULT_STATE_TTL_MINUTES: i64 = 5;
