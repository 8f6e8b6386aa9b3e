//! Domain models and their pure state transitions.
//!
//! Each collection type (`Cart`, `Favorites`, `NotificationLog`, `OrderBook`)
//! serializes exactly as it is stored remotely, so a reducer's output can be
//! written back as a full-collection overwrite without reshaping.

pub mod cart;
pub mod favorites;
pub mod notification;
pub mod order;
pub mod product;
pub mod user;

pub use cart::{Cart, CartChange, CartError, CartLine};
pub use favorites::{FavoriteOutcome, Favorites};
pub use notification::{Notification, NotificationDraft, NotificationLog};
pub use order::{Order, OrderBook};
pub use product::ProductRef;
pub use user::{UserDocument, UserProfile};
