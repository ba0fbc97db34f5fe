//! `kasir-auth`: staff identity, session state, and screen access.
//!
//! Decoupled from HTTP: the backend is reached through [`IdentityProvider`].

pub mod guard;
pub mod provider;
pub mod roles;
pub mod session;
pub mod user;

pub use guard::{Route, RouteDecision, guard};
pub use provider::IdentityProvider;
pub use roles::Role;
pub use session::{Session, SessionError};
pub use user::{AuthUser, UserProfile};
