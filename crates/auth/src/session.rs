//! Who is signed in at this terminal.
//!
//! The session mirrors the identity provider: it is filled on sign-in, cleared
//! on sign-out, and refreshed whenever the provider reports an auth event.

use secrecy::SecretString;
use thiserror::Error;

use kasir_core::UserId;
use kasir_events::{AuthEvent, Event, Subscription};

use crate::{AuthUser, IdentityProvider, Role, UserProfile};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("not signed in")]
    NotAuthenticated,

    #[error("admin role required")]
    AdminRequired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user: Option<AuthUser>,
    profile: Option<UserProfile>,
    loading: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// A session whose initial provider check has not run yet.
    pub fn new() -> Self {
        Self {
            user: None,
            profile: None,
            loading: true,
        }
    }

    /// A settled session with nobody signed in.
    pub fn signed_out() -> Self {
        Self {
            user: None,
            profile: None,
            loading: false,
        }
    }

    /// A session for an already-authenticated user.
    pub fn signed_in(user: AuthUser, profile: Option<UserProfile>) -> Self {
        Self {
            user: Some(user),
            profile,
            loading: false,
        }
    }

    pub fn user(&self) -> Option<&AuthUser> {
        self.user.as_ref()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user.as_ref().map(|u| u.id)
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.profile.as_ref().map(|p| p.role)
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some(Role::Admin)
    }

    pub fn is_cashier(&self) -> bool {
        self.role() == Some(Role::Cashier)
    }

    pub fn require_user(&self) -> Result<&AuthUser, SessionError> {
        self.user.as_ref().ok_or(SessionError::NotAuthenticated)
    }

    pub fn require_admin(&self) -> Result<&UserProfile, SessionError> {
        self.require_user()?;
        match &self.profile {
            Some(profile) if profile.role == Role::Admin => Ok(profile),
            _ => Err(SessionError::AdminRequired),
        }
    }

    /// Password sign-in. A missing or unreadable profile leaves the user
    /// signed in without a role.
    pub async fn sign_in<P>(
        &mut self,
        provider: &P,
        email: &str,
        password: &SecretString,
    ) -> Result<(), P::Error>
    where
        P: IdentityProvider + ?Sized,
    {
        let user = provider.sign_in(email, password).await?;
        let profile = match provider.user_profile(user.id).await {
            Ok(profile) => profile,
            Err(err) => {
                tracing::warn!(user_id = %user.id, error = %err, "profile lookup failed after sign-in");
                None
            }
        };

        tracing::info!(user_id = %user.id, role = ?profile.as_ref().map(|p| p.role), "signed in");
        self.user = Some(user);
        self.profile = profile;
        self.loading = false;
        Ok(())
    }

    /// Sign out at the provider. Local state is cleared even if the provider
    /// call fails.
    pub async fn sign_out<P>(&mut self, provider: &P) -> Result<(), P::Error>
    where
        P: IdentityProvider + ?Sized,
    {
        let result = provider.sign_out().await;
        self.clear();
        tracing::info!("signed out");
        result
    }

    /// Reload user and profile from the provider. Any failure clears the
    /// session.
    pub async fn refresh<P>(&mut self, provider: &P) -> Result<(), P::Error>
    where
        P: IdentityProvider + ?Sized,
    {
        let result = self.load(provider).await;
        if result.is_err() {
            self.clear();
        }
        self.loading = false;
        result
    }

    async fn load<P>(&mut self, provider: &P) -> Result<(), P::Error>
    where
        P: IdentityProvider + ?Sized,
    {
        let Some(user) = provider.current_user().await? else {
            self.clear();
            return Ok(());
        };

        let profile = provider.user_profile(user.id).await?;
        self.user = Some(user);
        self.profile = profile;
        Ok(())
    }

    pub async fn handle_event<P>(&mut self, provider: &P, event: &AuthEvent) -> Result<(), P::Error>
    where
        P: IdentityProvider + ?Sized,
    {
        tracing::debug!(event = event.event_type(), "auth event");
        match event {
            AuthEvent::SignedIn { .. } => self.refresh(provider).await,
            AuthEvent::SignedOut { .. } => {
                self.clear();
                Ok(())
            }
        }
    }

    /// Apply every queued auth event. Returns how many were handled.
    pub async fn sync<P>(
        &mut self,
        provider: &P,
        events: &Subscription<AuthEvent>,
    ) -> Result<usize, P::Error>
    where
        P: IdentityProvider + ?Sized,
    {
        let pending = events.drain();
        for event in &pending {
            self.handle_event(provider, event).await?;
        }
        Ok(pending.len())
    }

    fn clear(&mut self) {
        self.user = None;
        self.profile = None;
        self.loading = false;
    }
}
