//! This module re-exports various items from the `entity_api` crate.
//!
//! The purpose of this re-export is to ensure that consumers of the `domain` crate do not need to
//! directly depend on the `entity_api` crate. Database adapters for the `social-auth` traits live
//! here, together with the wiring that builds a sign-in flow from the application configuration.

// Re-exports from `entity` crate via `entity_api`
pub use entity_api::{oauth_states, social_accounts, users, Id};

pub mod error;
pub mod social_login;
pub mod state_store;
pub mod user_store;
