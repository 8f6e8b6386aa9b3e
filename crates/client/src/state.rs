//! Application state shared by the services.
//!
//! [`StoreState`] is the shopper's view state. It lives in a
//! [`StateContainer`] backed by a `tokio::sync::watch` channel, so views can
//! subscribe to changes and every mutation is applied atomically.

use std::convert::Infallible;
use std::sync::Arc;

use shopmate_core::{
    Cart, Favorites, NotificationLog, OrderBook, ThemeMode, UserDocument, UserId, UserProfile,
};
use tokio::sync::watch;
use tracing::warn;

use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::identity::IdentityProvider;
use crate::remote::DocumentStore;
use crate::session_cache::{PersistedSession, SessionCache, SessionCacheError};

/// Where the session gate stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Anonymous,
    /// A register or login call is in flight.
    Authenticating,
    Authenticated,
}

/// Everything the views render.
///
/// Collections are non-empty only while a user is signed in.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreState {
    pub session: SessionStatus,
    pub user: Option<UserProfile>,
    pub favorites: Favorites,
    pub cart: Cart,
    pub notifications: NotificationLog,
    pub orders: OrderBook,
    pub theme: ThemeMode,
    /// Whether the splash screen should be shown on next render.
    pub show_splash: bool,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            session: SessionStatus::Anonymous,
            user: None,
            favorites: Favorites::new(),
            cart: Cart::new(),
            notifications: NotificationLog::new(),
            orders: OrderBook::new(),
            theme: ThemeMode::default(),
            show_splash: true,
        }
    }
}

impl StoreState {
    /// The signed-in user's id.
    #[must_use]
    pub fn current_uid(&self) -> Option<&UserId> {
        self.user.as_ref().map(|u| &u.uid)
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    /// Replace the profile and every collection with a remote document.
    ///
    /// Signing in also retires the splash screen.
    pub fn load_document(&mut self, doc: UserDocument) {
        self.user = Some(doc.profile);
        self.favorites = doc.favorites;
        self.cart = doc.cart;
        self.notifications = doc.notifications;
        self.orders = doc.orders;
        self.session = SessionStatus::Authenticated;
        self.show_splash = false;
    }

    /// Drop the user and every collection; theme survives.
    pub fn clear_session(&mut self) {
        *self = Self {
            theme: self.theme,
            ..Self::default()
        };
    }

    #[must_use]
    pub fn to_persisted(&self) -> PersistedSession {
        PersistedSession {
            user: self.user.clone(),
            theme: self.theme,
            show_splash: self.show_splash,
        }
    }
}

/// Holds the current [`StoreState`] and notifies subscribers on change.
#[derive(Debug)]
pub struct StateContainer {
    tx: watch::Sender<StoreState>,
}

impl StateContainer {
    #[must_use]
    pub fn new(initial: StoreState) -> Self {
        Self {
            tx: watch::Sender::new(initial),
        }
    }

    /// A clone of the current state.
    #[must_use]
    pub fn snapshot(&self) -> StoreState {
        self.tx.borrow().clone()
    }

    /// Read the current state without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&StoreState) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Mutate the state in one step and notify subscribers.
    pub fn update<R>(&self, f: impl FnOnce(&mut StoreState) -> R) -> R {
        let Ok(value) = self.try_update(|state| Ok::<R, Infallible>(f(state)));
        value
    }

    /// Run a fallible mutation; subscribers are notified only on `Ok`.
    ///
    /// `f` must leave the state untouched when it returns `Err`.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns.
    pub fn try_update<R, E>(
        &self,
        f: impl FnOnce(&mut StoreState) -> Result<R, E>,
    ) -> Result<R, E> {
        let mut out = None;
        self.tx.send_if_modified(|state| {
            let result = f(state);
            let changed = result.is_ok();
            out = Some(result);
            changed
        });
        // send_if_modified runs the closure exactly once.
        out.unwrap_or_else(|| unreachable!("send_if_modified skipped the update"))
    }

    /// Watch for state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.tx.subscribe()
    }
}

impl Default for StateContainer {
    fn default() -> Self {
        Self::new(StoreState::default())
    }
}

/// Application state shared across services.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// state container and the injected collaborators.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ClientConfig,
    container: StateContainer,
    store: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityProvider>,
    clock: Arc<dyn Clock>,
    session_cache: Option<SessionCache>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .field("session_cache", &self.inner.session_cache)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Start building state around a document store and identity provider.
    #[must_use]
    pub fn builder(
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> AppStateBuilder {
        AppStateBuilder {
            config: ClientConfig::default(),
            store,
            identity,
            clock: Arc::new(SystemClock),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn container(&self) -> &StateContainer {
        &self.inner.container
    }

    #[must_use]
    pub fn store(&self) -> &dyn DocumentStore {
        self.inner.store.as_ref()
    }

    #[must_use]
    pub fn identity(&self) -> &dyn IdentityProvider {
        self.inner.identity.as_ref()
    }

    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.inner.clock.as_ref()
    }

    #[must_use]
    pub fn session_cache(&self) -> Option<&SessionCache> {
        self.inner.session_cache.as_ref()
    }

    /// Shorthand for `container().snapshot()`.
    #[must_use]
    pub fn snapshot(&self) -> StoreState {
        self.inner.container.snapshot()
    }

    /// Write the session snapshot, if a cache is configured.
    ///
    /// Failures are logged and otherwise ignored; the in-memory state is
    /// authoritative.
    pub async fn persist_session(&self) {
        let Some(cache) = self.session_cache() else {
            return;
        };
        let snapshot = self.inner.container.read(StoreState::to_persisted);
        if let Err(e) = cache.save(&snapshot).await {
            warn!(error = %e, "Failed to persist session snapshot");
        }
    }
}

/// Builder for [`AppState`].
pub struct AppStateBuilder {
    config: ClientConfig,
    store: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityProvider>,
    clock: Arc<dyn Clock>,
}

impl AppStateBuilder {
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Build the state.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured session cache key is invalid.
    pub fn build(self) -> Result<AppState, SessionCacheError> {
        let session_cache = self
            .config
            .session_cache
            .as_ref()
            .map(|c| SessionCache::new(c.path.clone(), &c.key))
            .transpose()?;

        Ok(AppState {
            inner: Arc::new(AppStateInner {
                config: self.config,
                container: StateContainer::default(),
                store: self.store,
                identity: self.identity,
                clock: self.clock,
                session_cache,
            }),
        })
    }
}
