//! Error types for the `social-auth` crate.
//!
//! Follows the same pattern as domain::error with a root Error struct and error kind enums.
//! Every failure of a handshake surfaces as its own kind so the calling layer can decide
//! how to answer the user (restart the flow on timeout, generic page on exchange failure).

use std::error::Error as StdError;
use std::fmt;

/// Top-level error type for social-auth crate.
/// Holds error kind and optional source for error chaining.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

/// Major categories of errors in social-auth.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    /// The provider name is not known to the settings resolver.
    UnknownProvider,
    Authentication(AuthenticationErrorKind),
    /// The remote profile is absent or lacks the fields reconciliation needs.
    InvalidProfile,
    Settings(SettingsErrorKind),
    Storage(StorageErrorKind),
    Http(HttpErrorKind),
}

/// Errors raised while validating a callback against its pending state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AuthenticationErrorKind {
    /// The callback carried no `state` parameter.
    StateMissing,
    /// No pending authentication exists for the state (expired or never issued).
    StateTimeout,
    /// The state already completed a callback.
    StateConsumed,
    /// The provider refused or failed the authorization code exchange.
    ExchangeFailed,
}

/// Errors from provider settings lookup.
#[derive(Debug, PartialEq)]
pub enum SettingsErrorKind {
    MissingKey,
    Unreadable,
    Invalid,
}

/// Errors from the state store and user persistence.
#[derive(Debug, PartialEq)]
pub enum StorageErrorKind {
    State,
    User,
    Conflict,
    EncryptionFailed,
    DecryptionFailed,
}

/// Errors from HTTP transport operations.
#[derive(Debug, PartialEq)]
pub enum HttpErrorKind {
    BuilderFailed,
    RequestFailed,
    Network,
    UnexpectedStatus,
}

/// Detail message attached to a missing `state` parameter.
pub const STATE_MISSING_DETAIL: &str = "not found";

/// Detail message attached to an expired or unknown `state`.
pub const STATE_TIMEOUT_DETAIL: &str = "authentication has taken too long, please try again";

impl Error {
    /// The human readable detail carried by this error, if any.
    pub fn detail(&self) -> Option<String> {
        self.source.as_ref().map(|source| source.to_string())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            ErrorKind::UnknownProvider => write!(f, "Unknown provider"),
            ErrorKind::Authentication(kind) => write!(f, "Authentication error: {:?}", kind),
            ErrorKind::InvalidProfile => write!(f, "Invalid profile"),
            ErrorKind::Settings(kind) => write!(f, "Settings error: {:?}", kind),
            ErrorKind::Storage(kind) => write!(f, "Storage error: {:?}", kind),
            ErrorKind::Http(kind) => write!(f, "HTTP error: {:?}", kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let error_kind = if err.is_builder() {
            ErrorKind::Http(HttpErrorKind::BuilderFailed)
        } else if err.is_request() {
            ErrorKind::Http(HttpErrorKind::RequestFailed)
        } else {
            ErrorKind::Http(HttpErrorKind::Network)
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

impl From<reqwest_middleware::Error> for Error {
    fn from(err: reqwest_middleware::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: ErrorKind::Http(HttpErrorKind::Network),
        }
    }
}

/// Helper function to create an unknown provider error.
pub fn unknown_provider_error(provider: &str) -> Error {
    Error {
        source: Some(format!("no settings for provider '{}'", provider).into()),
        error_kind: ErrorKind::UnknownProvider,
    }
}

/// Helper function to create authentication errors.
pub fn authentication_error(kind: AuthenticationErrorKind, detail: &str) -> Error {
    Error {
        source: Some(detail.to_string().into()),
        error_kind: ErrorKind::Authentication(kind),
    }
}

/// Helper function to create invalid profile errors.
pub fn invalid_profile_error(message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::InvalidProfile,
    }
}

/// Helper function to create settings errors.
pub fn settings_error(kind: SettingsErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Settings(kind),
    }
}

/// Helper function to create storage errors.
pub fn storage_error(kind: StorageErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Storage(kind),
    }
}

/// Helper function to create HTTP errors.
pub fn http_error(kind: HttpErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Http(kind),
    }
}
