//! Error types for the `domain` layer.
use entity_api::error::{EntityApiErrorKind, Error as EntityApiError};
use social_auth::error::{
    AuthenticationErrorKind, Error as SocialAuthError, ErrorKind as SocialAuthErrorKind,
    StorageErrorKind,
};
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree structure
/// with `domain::error::Error` as the root type holding a tree of `error_kind`
/// enums that represent the kinds of errors that can occur in the domain layer or
/// in lower layers. The `source` field is used to hold the original error that caused
/// the domain error. The intent is to translate errors between layers while maintaining
/// layer boundaries: the binary depends on `domain` only, never directly on `entity_api`.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    Internal(InternalErrorKind),
    External(ExternalErrorKind),
    /// The handshake was rejected; the user has to start over.
    Authentication(AuthenticationErrorKind),
}

/// Enum representing the various kinds of internal errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    Entity(EntityErrorKind),
    Config,
    Encryption,
    Other(String),
}

/// Enum representing the various kinds of entity errors that can bubble up from the "Entity" layer (`entity_api` and `entity`).
/// These errors are translated from the `entity_api` layer to the `domain` layer and reduced to a subset of error kinds
/// that are relevant to the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum EntityErrorKind {
    NotFound,
    Conflict,
    DbTransaction,
    Other(String),
}

/// Enum representing the various kinds of external errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum ExternalErrorKind {
    Network,
    /// The provider returned a profile that cannot be reconciled.
    InvalidProfile,
    Other(String),
}

impl Error {
    /// The detail message of the underlying social-auth error, if any.
    pub fn detail(&self) -> Option<String> {
        self.source
            .as_ref()
            .and_then(|source| source.downcast_ref::<SocialAuthError>())
            .and_then(SocialAuthError::detail)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Domain Error: {self:?}")
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

// This is where we translate errors from the `entity_api` layer to the `domain` layer.
impl From<EntityApiError> for Error {
    fn from(err: EntityApiError) -> Self {
        let entity_error_kind = match err.error_kind {
            EntityApiErrorKind::RecordNotFound => EntityErrorKind::NotFound,
            EntityApiErrorKind::RecordAlreadyExists => EntityErrorKind::Conflict,
            EntityApiErrorKind::SystemError => EntityErrorKind::DbTransaction,
            _ => EntityErrorKind::Other("EntityErrorKind".to_string()),
        };

        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(entity_error_kind)),
        }
    }
}

impl From<SocialAuthError> for Error {
    fn from(err: SocialAuthError) -> Self {
        let error_kind = match &err.error_kind {
            SocialAuthErrorKind::Authentication(kind) => DomainErrorKind::Authentication(*kind),
            SocialAuthErrorKind::UnknownProvider | SocialAuthErrorKind::Settings(_) => {
                DomainErrorKind::Internal(InternalErrorKind::Config)
            }
            SocialAuthErrorKind::InvalidProfile => {
                DomainErrorKind::External(ExternalErrorKind::InvalidProfile)
            }
            SocialAuthErrorKind::Http(_) => DomainErrorKind::External(ExternalErrorKind::Network),
            SocialAuthErrorKind::Storage(
                StorageErrorKind::EncryptionFailed | StorageErrorKind::DecryptionFailed,
            ) => DomainErrorKind::Internal(InternalErrorKind::Encryption),
            SocialAuthErrorKind::Storage(StorageErrorKind::Conflict) => {
                DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::Conflict))
            }
            SocialAuthErrorKind::Storage(_) => {
                DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::DbTransaction))
            }
        };
        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

/// Wraps an `entity_api` failure as a social-auth storage error so it can cross
/// the `StateStore`/`UserStore` seams.
pub(crate) fn storage_db_err(kind: StorageErrorKind, err: EntityApiError) -> SocialAuthError {
    let kind = match err.error_kind {
        EntityApiErrorKind::RecordAlreadyExists => StorageErrorKind::Conflict,
        _ => kind,
    };
    SocialAuthError {
        source: Some(Box::new(err)),
        error_kind: SocialAuthErrorKind::Storage(kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DbErr;
    use social_auth::error::{authentication_error, STATE_TIMEOUT_DETAIL};

    #[test]
    fn authentication_errors_keep_their_kind_and_detail() {
        let err: Error = authentication_error(
            AuthenticationErrorKind::StateTimeout,
            STATE_TIMEOUT_DETAIL,
        )
        .into();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Authentication(AuthenticationErrorKind::StateTimeout)
        );
        assert_eq!(err.detail().as_deref(), Some(STATE_TIMEOUT_DETAIL));
    }

    #[test]
    fn unknown_provider_is_a_config_error() {
        let err: Error = social_auth::error::unknown_provider_error("myspace").into();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Config)
        );
    }

    #[test]
    fn entity_api_errors_translate_to_entity_kinds() {
        let err: Error = EntityApiError::from(DbErr::RecordNotFound("users".to_string())).into();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::NotFound))
        );
    }

    #[test]
    fn storage_db_err_keeps_requested_kind_for_system_errors() {
        let err = storage_db_err(
            StorageErrorKind::State,
            EntityApiError::from(DbErr::Custom("boom".to_string())),
        );
        assert_eq!(
            err.error_kind,
            SocialAuthErrorKind::Storage(StorageErrorKind::State)
        );
    }
}
