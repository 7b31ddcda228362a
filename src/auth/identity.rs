//! Identity provider boundary
//!
//! Everything about sign-up, sign-in and token issuance sits behind
//! [`IdentityProvider`]. The session layer only ever talks to this trait.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;

use crate::auth::models::{Identity, ProfileUpdate};

/// Failures reported by an identity provider
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IdentityError {
    #[error("An account already exists for {0}")]
    EmailAlreadyInUse(String),

    #[error("Invalid email or password")]
    InvalidCredential,

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Password should be at least 6 characters")]
    WeakPassword,

    #[error("Sign-in popup was closed before completing")]
    PopupClosed,

    #[error("No user is signed in")]
    NoCurrentUser,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Identity state could not be persisted: {0}")]
    Storage(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account and sign it in
    async fn register(&self, email: &str, password: &str) -> Result<Identity, IdentityError>;

    async fn login(&self, email: &str, password: &str) -> Result<Identity, IdentityError>;

    /// Federated sign-in through the provider's popup flow
    async fn sign_in_with_popup(&self) -> Result<Identity, IdentityError>;

    async fn sign_out(&self) -> Result<(), IdentityError>;

    /// Update display name / photo of the signed-in user
    async fn update_profile(&self, update: &ProfileUpdate) -> Result<Identity, IdentityError>;

    fn current_user(&self) -> Option<Identity>;

    /// Session-change notifications. The receiver starts out holding the
    /// current user, so the first read always reflects the present state.
    fn subscribe(&self) -> watch::Receiver<Option<Identity>>;

    /// Bearer token for the signed-in user, minted anew when `force_refresh` is set
    async fn id_token(&self, force_refresh: bool) -> Result<String, IdentityError>;
}
