//! Short-lived key-value storage for pending authentications.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use super::PendingAuth;
use crate::error::Error;

/// Trait for storing pending authentications under namespaced state keys.
///
/// Implementations must be safe for concurrent callers; every key is independent
/// and each operation must be atomic for its key. An entry whose TTL has elapsed
/// must be invisible to `get` and `has`.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Store `value` under `key`, replacing any previous value and restarting its TTL.
    async fn put(&self, key: &str, value: PendingAuth, ttl: Duration) -> Result<(), Error>;

    /// Retrieve the live value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<PendingAuth>, Error>;

    /// Returns true if a live value is stored under `key`.
    async fn has(&self, key: &str) -> Result<bool, Error> {
        Ok(self.get(key).await?.is_some())
    }
}

#[async_trait]
impl<T: StateStore + ?Sized> StateStore for Arc<T> {
    async fn put(&self, key: &str, value: PendingAuth, ttl: Duration) -> Result<(), Error> {
        (**self).put(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> Result<Option<PendingAuth>, Error> {
        (**self).get(key).await
    }

    async fn has(&self, key: &str) -> Result<bool, Error> {
        (**self).has(key).await
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: PendingAuth,
    expires_at: DateTime<Utc>,
}

/// Process-local state store with per-entry expiry.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    entries: DashMap<String, Entry>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry.
    ///
    /// Expired entries are already invisible to readers; this only reclaims memory.
    pub fn purge_expired(&self) {
        let now = Utc::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
    }

    /// Number of entries held, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Expiry of the entry under `key`, if one is held.
    pub fn expires_at(&self, key: &str) -> Option<DateTime<Utc>> {
        self.entries.get(key).map(|entry| entry.expires_at)
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn put(&self, key: &str, value: PendingAuth, ttl: Duration) -> Result<(), Error> {
        let entry = Entry {
            value,
            expires_at: Utc::now() + ttl,
        };
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<PendingAuth>, Error> {
        let now = Utc::now();
        if let Some((_, entry)) = self.entries.remove_if(key, |_, entry| entry.expires_at <= now) {
            tracing::trace!("state entry {} expired at {}", key, entry.expires_at);
            return Ok(None);
        }
        Ok(self.entries.get(key).map(|entry| entry.value.clone()))
    }
}
