//! In-app notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{NotificationId, OrderId, Price};

/// A notification shown in the inbox.
///
/// The id is the creation timestamp in milliseconds. Only `read` ever
/// changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub title: String,
    pub description: String,
    /// Icon name understood by the view layer (e.g., "heart", "cart").
    pub icon: String,
    #[serde(default)]
    pub read: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// A notification before it has been stamped and appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDraft {
    pub title: String,
    pub description: String,
    pub icon: String,
}

impl NotificationDraft {
    /// A draft with arbitrary text.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        icon: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            icon: icon.into(),
        }
    }

    #[must_use]
    pub fn welcome(name: &str) -> Self {
        Self::new(
            "Welcome to Shopmate",
            format!("Hi {name}, your account is ready. Happy shopping!"),
            "gift",
        )
    }

    #[must_use]
    pub fn favorite_added(product_name: &str) -> Self {
        Self::new(
            "Added to Favorites",
            format!("{product_name} has been added to your favorites."),
            "heart",
        )
    }

    #[must_use]
    pub fn favorite_removed(product_name: &str) -> Self {
        Self::new(
            "Removed from Favorites",
            format!("{product_name} has been removed from your favorites."),
            "heart-dislike",
        )
    }

    #[must_use]
    pub fn cart_added(product_name: &str) -> Self {
        Self::new(
            "Added to Cart",
            format!("{product_name} has been added to your cart."),
            "cart",
        )
    }

    #[must_use]
    pub fn cart_updated(product_name: &str, quantity: u32) -> Self {
        Self::new(
            "Cart Updated",
            format!("Quantity of {product_name} increased to {quantity}."),
            "cart",
        )
    }

    #[must_use]
    pub fn order_placed(order_id: &OrderId, total: Price) -> Self {
        Self::new(
            "Order Placed",
            format!("Your order {order_id} of {total} is being processed."),
            "receipt",
        )
    }

    /// Stamp the draft with `now`, unread.
    #[must_use]
    pub fn into_notification(self, now: DateTime<Utc>) -> Notification {
        Notification {
            id: NotificationId::new(now.timestamp_millis()),
            title: self.title,
            description: self.description,
            icon: self.icon,
            read: false,
            timestamp: now,
        }
    }
}

/// Append-only notification log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationLog {
    entries: Vec<Notification>,
}

impl NotificationLog {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[Notification] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, notification: Notification) {
        self.entries.push(notification);
    }

    /// Mark every entry with this id as read. Returns whether any matched.
    pub fn mark_as_read(&mut self, id: NotificationId) -> bool {
        let mut found = false;
        for entry in self.entries.iter_mut().filter(|n| n.id == id) {
            entry.read = true;
            found = true;
        }
        found
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.entries.iter().filter(|n| !n.read).count()
    }
}
