pub use entity::{oauth_states, social_accounts, users, Id};

pub mod error;
pub mod oauth_state;
pub mod social_account;
pub mod user;
