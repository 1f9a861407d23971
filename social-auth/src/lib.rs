//! # social-auth
//!
//! Sign-in through third-party OAuth 2.0 providers:
//! - Provider settings resolution and a registry of provider networks
//! - The two-phase handshake (`AuthFlow::initiate` / `AuthFlow::callback`)
//! - Short-lived anti-forgery state storage
//! - Reconciliation of remote profiles onto local users
//!
//! ## Architecture
//!
//! This crate has no database dependency. Persistence sits behind the
//! [`state::StateStore`] and [`reconcile::UserStore`] traits; in-memory
//! implementations ship here and the `domain` crate provides database-backed ones.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use social_auth::{
//!     flow::AuthFlow,
//!     network::NetworkRegistry,
//!     reconcile::MemoryUserStore,
//!     state::MemoryStateStore,
//! };
//!
//! let flow = AuthFlow::new(networks, MemoryStateStore::new(), MemoryUserStore::new());
//! let target = flow.initiate("github").await?;
//! // redirect to target.url, then on return:
//! let outcome = flow.callback("github", &query_params).await?;
//! ```

pub mod cipher;
pub mod error;
pub mod flow;
pub mod http;
pub mod network;
pub mod reconcile;
pub mod settings;
pub mod state;

// Re-export commonly used types
pub use error::{Error, ErrorKind};
