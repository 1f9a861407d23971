pub use super::oauth_states::Entity as OauthStates;
pub use super::social_accounts::Entity as SocialAccounts;
pub use super::users::Entity as Users;
