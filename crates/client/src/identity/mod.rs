//! Identity provider seam.
//!
//! The provider owns credentials and the signed-in identity; the client only
//! sees the uid, email and display fields it hands back.

mod memory;

use async_trait::async_trait;
use secrecy::SecretString;
use shopmate_core::UserId;
use thiserror::Error;

pub use memory::InMemoryIdentityProvider;

/// Errors reported by an identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("email already in use")]
    EmailAlreadyInUse,

    #[error("invalid email address")]
    InvalidEmail,

    #[error("user not found")]
    UserNotFound,

    #[error("wrong password")]
    WrongPassword,

    #[error("password rejected: {0}")]
    WeakPassword(String),

    #[error("no signed-in user")]
    NotSignedIn,

    /// Anything the provider reports that has no dedicated variant.
    #[error("{0}")]
    Other(String),
}

/// The identity as the provider reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub uid: UserId,
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

/// A change to the provider-side profile of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileUpdate {
    DisplayName(String),
    PhotoUrl(String),
}

/// Authentication backend.
///
/// Implementations keep track of the currently signed-in user, the way a
/// device-local auth SDK does.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account and sign it in.
    async fn create_user_with_email_and_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthenticatedUser, IdentityError>;

    /// Sign in an existing account.
    async fn sign_in_with_email_and_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthenticatedUser, IdentityError>;

    /// Update the signed-in user's provider profile.
    async fn update_profile(&self, update: ProfileUpdate) -> Result<(), IdentityError>;

    async fn sign_out(&self) -> Result<(), IdentityError>;

    /// The signed-in user, if any.
    async fn current_user(&self) -> Option<AuthenticatedUser>;
}
