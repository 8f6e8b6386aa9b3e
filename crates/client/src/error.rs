//! Unified error handling with Sentry integration.
//!
//! Every fallible client operation returns [`ClientError`]. The view layer
//! shows [`ClientError::user_message`] and calls [`ClientError::report`],
//! which captures infrastructure failures to Sentry.

use shopmate_core::{CartError, PricingError, ProductId, UserId};
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::identity::IdentityError;
use crate::remote::StoreError;
use crate::session_cache::SessionCacheError;

/// Client-level error type.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A mutating operation was called with nobody signed in.
    #[error("no active session")]
    NoActiveSession,

    /// The cart has no line for this product.
    #[error("item not found in cart: {0}")]
    ItemNotFound(ProductId),

    /// Signed in, but `users/{uid}` does not exist.
    #[error("user profile missing for {0}")]
    ProfileMissing(UserId),

    #[error("email already in use")]
    DuplicateEmail,

    #[error("invalid email address")]
    InvalidEmail,

    #[error("user not found")]
    UserNotFound,

    #[error("wrong password")]
    WrongPassword,

    /// Any other identity-provider failure.
    #[error("authentication failed: {0}")]
    UnknownAuthError(String),

    /// The local change stands; the remote copy is stale.
    #[error("remote write failed: {0}")]
    RemoteWriteFailed(#[source] StoreError),

    #[error("remote read failed: {0}")]
    RemoteReadFailed(#[source] StoreError),

    /// Checkout with nothing in the cart.
    #[error("cart is empty")]
    EmptyCart,

    #[error("pricing error: {0}")]
    Pricing(#[from] PricingError),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("session cache error: {0}")]
    SessionCache(#[from] SessionCacheError),
}

impl From<IdentityError> for ClientError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::EmailAlreadyInUse => Self::DuplicateEmail,
            IdentityError::InvalidEmail => Self::InvalidEmail,
            IdentityError::UserNotFound => Self::UserNotFound,
            IdentityError::WrongPassword => Self::WrongPassword,
            IdentityError::NotSignedIn => Self::NoActiveSession,
            other @ (IdentityError::WeakPassword(_) | IdentityError::Other(_)) => {
                Self::UnknownAuthError(other.to_string())
            }
        }
    }
}

impl From<CartError> for ClientError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::ItemNotFound(id) => Self::ItemNotFound(id),
        }
    }
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Title and body for an alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserMessage {
    pub title: &'static str,
    pub body: String,
}

impl UserMessage {
    fn new(title: &'static str, body: impl Into<String>) -> Self {
        Self {
            title,
            body: body.into(),
        }
    }
}

impl ClientError {
    /// Wording to show the shopper. Internal details are not exposed.
    #[must_use]
    pub fn user_message(&self) -> UserMessage {
        match self {
            Self::NoActiveSession => UserMessage::new("Not Signed In", "Please log in to continue."),
            Self::ItemNotFound(_) => {
                UserMessage::new("Cart", "That item is no longer in your cart.")
            }
            Self::ProfileMissing(_) => {
                UserMessage::new("Login Failed", "User data not found in the database.")
            }
            Self::DuplicateEmail => UserMessage::new(
                "Registration Failed",
                "An account with this email already exists.",
            ),
            Self::InvalidEmail => {
                UserMessage::new("Invalid Email", "Please enter a valid email address.")
            }
            Self::UserNotFound => {
                UserMessage::new("Login Failed", "No account found with this email.")
            }
            Self::WrongPassword => UserMessage::new("Login Failed", "Incorrect password."),
            Self::UnknownAuthError(msg) => UserMessage::new("Authentication Error", msg.clone()),
            Self::RemoteWriteFailed(_) => UserMessage::new(
                "Sync Failed",
                "Your change was saved on this device but could not be synced.",
            ),
            Self::RemoteReadFailed(_) => {
                UserMessage::new("Sync Failed", "Could not load your data. Please try again.")
            }
            Self::EmptyCart => UserMessage::new("Checkout", "Your cart is empty."),
            Self::Pricing(PricingError::UnknownPromoCode(_)) => {
                UserMessage::new("Invalid Promo Code", "That promo code is not valid.")
            }
            Self::Pricing(_) => UserMessage::new("Checkout", "Pricing is unavailable right now."),
            Self::Catalog(_) => {
                UserMessage::new("Products", "Could not load products. Please try again.")
            }
            Self::SessionCache(_) => {
                UserMessage::new("Session", "Your saved session could not be restored.")
            }
        }
    }

    /// Whether this error is an infrastructure failure worth capturing.
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        matches!(
            self,
            Self::RemoteWriteFailed(_)
                | Self::RemoteReadFailed(_)
                | Self::UnknownAuthError(_)
                | Self::Catalog(_)
                | Self::SessionCache(_)
        )
    }

    /// Log the error, capturing infrastructure failures to Sentry.
    pub fn report(&self) {
        if self.is_reportable() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Client error"
            );
        } else {
            tracing::info!(error = %self, "Operation rejected");
        }
    }
}

/// Set the Sentry user context.
///
/// Call this after sign-in to associate errors with the shopper.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context on sign-out.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a shopper action.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Increased quantity", Some(&[("product_id", "12")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
