//! Mapping remote profiles onto local users.

mod memory;
mod reconciler;
mod store;

pub use memory::MemoryUserStore;
pub use reconciler::{Reconciliation, UserReconciler};
pub use store::{LocalUser, NewSocialAccount, NewUser, SocialAccount, UserStore};
