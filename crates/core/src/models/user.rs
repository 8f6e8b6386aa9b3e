//! User profile and the remote user document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::cart::Cart;
use crate::models::favorites::Favorites;
use crate::models::notification::NotificationLog;
use crate::models::order::OrderBook;
use crate::types::{Email, UserId};

/// The signed-in shopper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Identity-provider user id.
    pub uid: UserId,
    pub email: Email,
    /// Display name.
    pub name: String,
    /// Handle chosen at sign-up.
    pub user_name: String,
    /// Profile photo URL; empty until one is uploaded.
    #[serde(rename = "photoURL", default)]
    pub photo_url: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// Everything stored under `users/{uid}`.
///
/// Collections that were never written are missing from the stored document
/// and come back empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDocument {
    #[serde(flatten)]
    pub profile: UserProfile,
    #[serde(default)]
    pub favorites: Favorites,
    #[serde(default)]
    pub cart: Cart,
    #[serde(default)]
    pub notifications: NotificationLog,
    #[serde(default)]
    pub orders: OrderBook,
}

impl UserDocument {
    /// A new document with empty collections.
    #[must_use]
    pub fn fresh(profile: UserProfile) -> Self {
        Self {
            profile,
            favorites: Favorites::new(),
            cart: Cart::new(),
            notifications: NotificationLog::new(),
            orders: OrderBook::new(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn profile() -> UserProfile {
        UserProfile {
            uid: UserId::new("u-1"),
            email: Email::parse("asha@example.com").unwrap(),
            name: "Asha".to_string(),
            user_name: "asha".to_string(),
            photo_url: String::new(),
            created_at: Utc.timestamp_millis_opt(1_000).unwrap(),
        }
    }

    #[test]
    fn test_fresh_document_wire_shape() {
        let json = serde_json::to_value(UserDocument::fresh(profile())).unwrap();
        assert_eq!(json["uid"], "u-1");
        assert_eq!(json["userName"], "asha");
        assert_eq!(json["photoURL"], "");
        assert_eq!(json["createdAt"], 1_000);
        assert_eq!(json["cart"], json!([]));
        assert_eq!(json["orders"], json!({}));
    }

    #[test]
    fn test_missing_collections_default_to_empty() {
        let stored = json!({
            "uid": "u-1",
            "email": "asha@example.com",
            "name": "Asha",
            "userName": "asha",
            "createdAt": 1_000
        });
        let doc: UserDocument = serde_json::from_value(stored).unwrap();
        assert_eq!(doc.profile, profile());
        assert!(doc.cart.is_empty());
        assert!(doc.favorites.is_empty());
        assert!(doc.notifications.is_empty());
        assert!(doc.orders.is_empty());
    }
}
