//! Integration tests for Shopmate.
//!
//! # Running Tests
//!
//! ```bash
//! # In-memory collaborators only
//! cargo test -p shopmate-integration-tests
//!
//! # Including the PostgreSQL document store
//! SHOPMATE_DATABASE_URL=postgres://... \
//!     cargo test -p shopmate-integration-tests --features postgres -- --include-ignored
//! ```
//!
//! # Test Categories
//!
//! - `cart_flows` - Cart reducer, totals and checkout
//! - `session_lifecycle` - Register, login, logout, sync, session cache
//! - `collections` - Favorites, notifications, orders and the session gate
//! - `remote_sync` - Remote failures, retries and divergence
//! - `postgres_store` - `PgDocumentStore` against a live database

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use secrecy::SecretString;
use shopmate_client::AppState;
use shopmate_client::clock::ManualClock;
use shopmate_client::config::{ClientConfig, SessionCacheConfig};
use shopmate_client::identity::InMemoryIdentityProvider;
use shopmate_client::remote::InMemoryDocumentStore;
use shopmate_client::services::{RegisterRequest, SessionService};
use shopmate_client::session_cache::SessionCache;
use shopmate_client::sync::SyncPolicy;
use shopmate_core::{ProductId, ProductRef, UserProfile};

pub const EMAIL: &str = "asha@example.com";
pub const PASSWORD: &str = "correct-horse-battery";

/// A fully wired client over in-memory collaborators and a manual clock.
pub struct TestContext {
    pub state: AppState,
    pub store: Arc<InMemoryDocumentStore>,
    pub identity: Arc<InMemoryIdentityProvider>,
    pub clock: Arc<ManualClock>,
}

impl TestContext {
    /// A context with no retries and no session cache.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// A context over the given configuration.
    ///
    /// # Panics
    ///
    /// Panics if the configuration's session cache key is invalid.
    #[must_use]
    pub fn with_config(config: ClientConfig) -> Self {
        let store = Arc::new(InMemoryDocumentStore::new());
        let identity = Arc::new(InMemoryIdentityProvider::new());
        Self::with_collaborators(config, store, identity)
    }

    /// A second client sharing this context's store and identity provider,
    /// as if the app were restarted.
    #[must_use]
    pub fn restart(&self, config: ClientConfig) -> Self {
        Self::with_collaborators(config, self.store.clone(), self.identity.clone())
    }

    fn with_collaborators(
        config: ClientConfig,
        store: Arc<InMemoryDocumentStore>,
        identity: Arc<InMemoryIdentityProvider>,
    ) -> Self {
        let clock = Arc::new(ManualClock::new(start_time()));
        let state = AppState::builder(store.clone(), identity.clone())
            .config(config)
            .clock(clock.clone())
            .build()
            .unwrap_or_else(|e| panic!("invalid test configuration: {e}"));
        Self {
            state,
            store,
            identity,
            clock,
        }
    }

    #[must_use]
    pub fn session(&self) -> SessionService<'_> {
        SessionService::new(&self.state)
    }

    /// Register the default shopper.
    ///
    /// # Panics
    ///
    /// Panics if registration fails.
    pub async fn register(&self) -> UserProfile {
        self.session()
            .register(register_request("Asha", "asha", EMAIL))
            .await
            .unwrap_or_else(|e| panic!("registration failed: {e}"))
    }

    /// Move the clock forward by whole seconds.
    pub fn tick(&self, secs: i64) {
        self.clock.advance(chrono::Duration::seconds(secs));
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Default configuration with remote writes attempted once.
#[must_use]
pub fn test_config() -> ClientConfig {
    ClientConfig {
        sync: SyncPolicy::no_retry(),
        ..ClientConfig::default()
    }
}

/// Configuration with retries on a short backoff.
#[must_use]
pub fn retrying_config(max_attempts: u32) -> ClientConfig {
    ClientConfig {
        sync: SyncPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
        },
        ..ClientConfig::default()
    }
}

/// Configuration with an encrypted session cache at `path`.
#[must_use]
pub fn cached_config(path: &std::path::Path, key: SecretString) -> ClientConfig {
    ClientConfig {
        session_cache: Some(SessionCacheConfig {
            path: path.to_path_buf(),
            key,
        }),
        ..test_config()
    }
}

/// A fresh session cache key.
#[must_use]
pub fn cache_key() -> SecretString {
    SessionCache::generate_key()
}

#[must_use]
pub fn register_request(name: &str, user_name: &str, email: &str) -> RegisterRequest {
    RegisterRequest {
        name: name.to_string(),
        user_name: user_name.to_string(),
        email: email.to_string(),
        password: password(),
    }
}

#[must_use]
pub fn password() -> SecretString {
    SecretString::from(PASSWORD)
}

/// A product with a whole-number price.
#[must_use]
pub fn product(id: i64, price: i64) -> ProductRef {
    ProductRef::new(ProductId::new(id), format!("Product {id}"), Decimal::from(price))
}

/// 2026-03-01 10:00:00 UTC.
///
/// # Panics
///
/// Never; the date is valid.
#[must_use]
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0)
        .single()
        .unwrap_or_else(|| unreachable!("valid date"))
}
