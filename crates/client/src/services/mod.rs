//! Business logic services.
//!
//! # Services
//!
//! - `session` - Register, login, logout, sync, profile photo, theme
//! - `favorites` - Favorite toggle
//! - `cart` - Cart quantity reducer and totals
//! - `notifications` - Notification inbox
//! - `orders` - Order creation and checkout
//!
//! Each service borrows [`AppState`]. Collection operations follow the same
//! order: check for a signed-in user, apply the reducer to local state,
//! overwrite the remote collection, then record a notification. A failed
//! remote write leaves the local change in place and skips the
//! notification; a failed notification never fails the operation.

pub mod cart;
pub mod favorites;
pub mod notifications;
pub mod orders;
pub mod session;

pub use cart::CartService;
pub use favorites::FavoritesService;
pub use notifications::NotificationService;
pub use orders::{CheckoutReceipt, CheckoutRequest, OrderService};
pub use session::{RegisterRequest, SessionService, SyncOutcome};

use serde::Serialize;
use shopmate_core::UserId;
use tracing::warn;

use crate::error::{ClientError, Result};
use crate::remote::{self, DocumentPath};
use crate::state::AppState;

/// The signed-in user's id.
fn require_uid(state: &AppState) -> Result<UserId> {
    state
        .container()
        .read(|s| s.current_uid().cloned())
        .ok_or(ClientError::NoActiveSession)
}

/// Overwrite `users/{uid}/{field}` with `value`, retrying per the sync policy.
async fn mirror<T: Serialize + ?Sized>(
    state: &AppState,
    uid: &UserId,
    field: &str,
    value: &T,
) -> Result<()> {
    let path = DocumentPath::user_field(uid, field);
    let value = remote::encode(value).map_err(ClientError::RemoteWriteFailed)?;
    state
        .config()
        .sync
        .write(state.store(), &path, value)
        .await
        .map_err(|e| {
            warn!(%path, error = %e, "Remote write failed; local state kept");
            ClientError::RemoteWriteFailed(e)
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use secrecy::SecretString;
    use shopmate_core::{ProductId, ProductRef};

    use super::{RegisterRequest, SessionService};
    use crate::clock::ManualClock;
    use crate::config::ClientConfig;
    use crate::identity::InMemoryIdentityProvider;
    use crate::remote::InMemoryDocumentStore;
    use crate::state::AppState;
    use crate::sync::SyncPolicy;

    pub struct Harness {
        pub state: AppState,
        pub store: Arc<InMemoryDocumentStore>,
        pub clock: Arc<ManualClock>,
    }

    pub fn harness() -> Harness {
        let store = Arc::new(InMemoryDocumentStore::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap(),
        ));
        let config = ClientConfig {
            sync: SyncPolicy::no_retry(),
            ..ClientConfig::default()
        };
        let state = AppState::builder(store.clone(), Arc::new(InMemoryIdentityProvider::new()))
            .config(config)
            .clock(clock.clone())
            .build()
            .unwrap();
        Harness {
            state,
            store,
            clock,
        }
    }

    pub async fn signed_in() -> Harness {
        let h = harness();
        SessionService::new(&h.state)
            .register(RegisterRequest {
                name: "Asha".to_string(),
                user_name: "asha".to_string(),
                email: "asha@example.com".to_string(),
                password: SecretString::from("hunter22"),
            })
            .await
            .unwrap();
        h
    }

    pub fn product(id: i64, price: i64) -> ProductRef {
        ProductRef::new(ProductId::new(id), format!("Product {id}"), Decimal::from(price))
    }
}
