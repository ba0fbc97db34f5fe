use async_trait::async_trait;
use secrecy::SecretString;

use kasir_core::UserId;

use crate::{AuthUser, UserProfile};

/// Identity operations the session needs from the backend.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Password sign-in; returns the authenticated account.
    async fn sign_in(&self, email: &str, password: &SecretString) -> Result<AuthUser, Self::Error>;

    async fn sign_out(&self) -> Result<(), Self::Error>;

    /// The account of the current backend session, if any.
    async fn current_user(&self) -> Result<Option<AuthUser>, Self::Error>;

    async fn user_profile(&self, user_id: UserId) -> Result<Option<UserProfile>, Self::Error>;
}
