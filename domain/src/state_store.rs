//! Database-backed state store with the pending access token encrypted at rest.
//!
//! Implements `social_auth::state::StateStore` using the `oauth_states` table.
//! Expired rows are filtered out on read; `purge_expired` reclaims them.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use log::*;
use sea_orm::DatabaseConnection;

use entity_api::oauth_state;
use social_auth::{
    cipher::TokenCipher,
    error::{Error, ErrorKind, StorageErrorKind},
    state::{PendingAuth, StateStore},
};

use crate::error::storage_db_err;

pub struct DbStateStore {
    db: Arc<DatabaseConnection>,
    cipher: TokenCipher,
}

impl DbStateStore {
    pub fn new(db: Arc<DatabaseConnection>, cipher: TokenCipher) -> Self {
        Self { db, cipher }
    }

    /// Delete every expired pending authentication, returning how many were removed.
    pub async fn purge_expired(&self) -> Result<u64, Error> {
        oauth_state::purge_expired(self.db.as_ref())
            .await
            .map_err(|e| storage_db_err(StorageErrorKind::State, e))
    }
}

fn payload_err(err: serde_json::Error) -> Error {
    Error {
        source: Some(Box::new(err)),
        error_kind: ErrorKind::Storage(StorageErrorKind::State),
    }
}

#[async_trait]
impl StateStore for DbStateStore {
    async fn put(&self, key: &str, value: PendingAuth, ttl: Duration) -> Result<(), Error> {
        let sealed = PendingAuth {
            access_token: value
                .access_token
                .as_deref()
                .map(|token| self.cipher.seal(token))
                .transpose()?,
            ..value
        };
        let payload = serde_json::to_value(&sealed).map_err(payload_err)?;

        oauth_state::upsert(self.db.as_ref(), key, payload, Utc::now() + ttl)
            .await
            .map_err(|e| storage_db_err(StorageErrorKind::State, e))?;

        trace!("Stored pending authentication under {key}");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<PendingAuth>, Error> {
        let Some(row) = oauth_state::find_live(self.db.as_ref(), key)
            .await
            .map_err(|e| storage_db_err(StorageErrorKind::State, e))?
        else {
            return Ok(None);
        };

        let sealed: PendingAuth = serde_json::from_value(row.payload).map_err(payload_err)?;
        let access_token = sealed
            .access_token
            .as_deref()
            .map(|token| self.cipher.open(token))
            .transpose()?;

        Ok(Some(PendingAuth {
            access_token,
            ..sealed
        }))
    }
}
