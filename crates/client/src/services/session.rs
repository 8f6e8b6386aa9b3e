//! Session service.
//!
//! Gates every other service: collections are only populated while a user
//! is signed in. Login and sync replace local state with the remote user
//! document; logout wipes it.

use secrecy::SecretString;
use serde_json::Value;
use shopmate_core::{Email, NotificationDraft, ThemeMode, UserDocument, UserId, UserProfile};
use tracing::{info, instrument, warn};

use super::{NotificationService, require_uid};
use crate::error::{ClientError, Result, clear_sentry_user, set_sentry_user};
use crate::identity::{AuthenticatedUser, ProfileUpdate};
use crate::remote::{self, DocumentPath, field, get_typed};
use crate::state::{AppState, SessionStatus};

/// Sign-up form.
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub name: String,
    pub user_name: String,
    pub email: String,
    pub password: SecretString,
}

/// Result of [`SessionService::sync_user_data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The identity provider has nobody signed in; nothing changed.
    NoSession,
    /// Local state now matches the remote document.
    Synced,
}

/// Registration, login, logout and session-level preferences.
pub struct SessionService<'a> {
    state: &'a AppState,
}

impl<'a> SessionService<'a> {
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Create an account, write a fresh user document and sign in.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::DuplicateEmail`, `ClientError::InvalidEmail` or
    /// `ClientError::UnknownAuthError` from the identity provider, or
    /// `ClientError::RemoteWriteFailed` if the user document could not be
    /// created. The session returns to its previous status on failure, and
    /// a newly created account is signed out again.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: RegisterRequest) -> Result<UserProfile> {
        let previous = self.begin_authenticating();
        match self.try_register(request).await {
            Ok(profile) => Ok(profile),
            Err(e) => {
                self.abort_authenticating(previous);
                Err(e)
            }
        }
    }

    async fn try_register(&self, request: RegisterRequest) -> Result<UserProfile> {
        let identity = self.state.identity();
        let user = identity
            .create_user_with_email_and_password(&request.email, &request.password)
            .await?;

        // The account exists from here on; never leave it signed in without
        // a user document.
        let document = match self.create_document(request, user).await {
            Ok(document) => document,
            Err(e) => {
                if let Err(sign_out) = identity.sign_out().await {
                    warn!(error = %sign_out, "Sign-out after failed registration failed");
                }
                return Err(e);
            }
        };

        let profile = document.profile.clone();
        self.enter_session(document).await;
        info!(uid = %profile.uid, "Registered");

        NotificationService::new(self.state)
            .notify(NotificationDraft::welcome(&profile.name))
            .await;

        Ok(profile)
    }

    async fn create_document(
        &self,
        request: RegisterRequest,
        user: AuthenticatedUser,
    ) -> Result<UserDocument> {
        self.state
            .identity()
            .update_profile(ProfileUpdate::DisplayName(request.name.clone()))
            .await?;

        let profile = UserProfile {
            email: parse_email(&user)?,
            uid: user.uid,
            name: request.name,
            user_name: request.user_name,
            photo_url: String::new(),
            created_at: self.state.clock().now(),
        };
        let document = UserDocument::fresh(profile);

        let value = remote::encode(&document).map_err(ClientError::RemoteWriteFailed)?;
        self.state
            .config()
            .sync
            .write(
                self.state.store(),
                &DocumentPath::user(&document.profile.uid),
                value,
            )
            .await
            .map_err(ClientError::RemoteWriteFailed)?;

        Ok(document)
    }

    /// Sign in and load the user document.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::UserNotFound`, `ClientError::WrongPassword`,
    /// `ClientError::InvalidEmail` or `ClientError::UnknownAuthError` from
    /// the identity provider, `ClientError::RemoteReadFailed` if the
    /// document could not be read, or `ClientError::ProfileMissing` if it
    /// does not exist (the identity is signed out again in that case).
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<UserProfile> {
        let previous = self.begin_authenticating();
        match self.try_login(email, password).await {
            Ok(profile) => Ok(profile),
            Err(e) => {
                self.abort_authenticating(previous);
                Err(e)
            }
        }
    }

    async fn try_login(&self, email: &str, password: &SecretString) -> Result<UserProfile> {
        let identity = self.state.identity();
        let user = identity
            .sign_in_with_email_and_password(email, password)
            .await?;

        let Some(document) = self.fetch_document(&user.uid).await? else {
            if let Err(e) = identity.sign_out().await {
                warn!(error = %e, "Sign-out after missing profile failed");
            }
            return Err(ClientError::ProfileMissing(user.uid));
        };

        let profile = document.profile.clone();
        self.enter_session(document).await;
        info!(uid = %profile.uid, "Logged in");
        Ok(profile)
    }

    /// Sign out and wipe local state.
    ///
    /// Local state is cleared and the splash screen re-armed even when the
    /// identity provider fails to sign out.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::UnknownAuthError` if the provider sign-out
    /// failed.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<()> {
        let signed_out = self.state.identity().sign_out().await;

        let uid = self.state.container().update(|s| {
            let uid = s.current_uid().cloned();
            s.clear_session();
            uid
        });
        self.state.persist_session().await;
        clear_sentry_user();

        match signed_out {
            Ok(()) => {
                info!(uid = ?uid.as_ref().map(UserId::as_str), "Logged out");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Identity sign-out failed; local session cleared anyway");
                Err(ClientError::UnknownAuthError(e.to_string()))
            }
        }
    }

    /// Reload the signed-in user's document into local state.
    ///
    /// Does nothing if the identity provider has nobody signed in.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::RemoteReadFailed` if the document could not be
    /// read, or `ClientError::ProfileMissing` if it does not exist.
    #[instrument(skip(self))]
    pub async fn sync_user_data(&self) -> Result<SyncOutcome> {
        let Some(user) = self.state.identity().current_user().await else {
            return Ok(SyncOutcome::NoSession);
        };

        let document = self
            .fetch_document(&user.uid)
            .await?
            .ok_or_else(|| ClientError::ProfileMissing(user.uid.clone()))?;

        self.enter_session(document).await;
        info!(uid = %user.uid, "User data synced");
        Ok(SyncOutcome::Synced)
    }

    /// Restore the last session snapshot, if a session cache is configured.
    ///
    /// Returns `true` if a signed-in user was restored. Collections stay
    /// empty until [`Self::sync_user_data`] runs.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::SessionCache` if the snapshot exists but cannot
    /// be read or decrypted.
    pub async fn restore(&self) -> Result<bool> {
        let Some(cache) = self.state.session_cache() else {
            return Ok(false);
        };
        let Some(saved) = cache.load().await? else {
            return Ok(false);
        };

        let restored = self.state.container().update(|s| {
            s.theme = saved.theme;
            s.show_splash = saved.show_splash;
            match saved.user {
                Some(user) => {
                    s.user = Some(user);
                    s.session = SessionStatus::Authenticated;
                    true
                }
                None => false,
            }
        });
        Ok(restored)
    }

    /// Set the profile photo on the provider and in the user document.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NoActiveSession` if nobody is signed in,
    /// an identity error if the provider rejects the update, or
    /// `ClientError::RemoteWriteFailed` if the document could not be
    /// updated.
    #[instrument(skip(self))]
    pub async fn update_profile_photo(&self, photo_url: &str) -> Result<()> {
        let uid = require_uid(self.state)?;

        self.state
            .identity()
            .update_profile(ProfileUpdate::PhotoUrl(photo_url.to_string()))
            .await?;

        let path = DocumentPath::user_field(&uid, field::PHOTO_URL);
        self.state
            .config()
            .sync
            .write(
                self.state.store(),
                &path,
                Value::String(photo_url.to_string()),
            )
            .await
            .map_err(ClientError::RemoteWriteFailed)?;

        self.state.container().update(|s| {
            if let Some(user) = s.user.as_mut().filter(|u| u.uid == uid) {
                user.photo_url = photo_url.to_string();
            }
        });
        self.state.persist_session().await;
        Ok(())
    }

    /// Switch theme; `None` flips the current one.
    pub async fn toggle_theme(&self, theme: Option<ThemeMode>) -> ThemeMode {
        let theme = self.state.container().update(|s| {
            s.theme = theme.unwrap_or_else(|| s.theme.toggled());
            s.theme
        });
        self.state.persist_session().await;
        theme
    }

    /// Hide the splash screen until the next logout.
    pub async fn dismiss_splash(&self) {
        self.state.container().update(|s| s.show_splash = false);
        self.state.persist_session().await;
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.state.container().read(|s| s.session)
    }

    #[must_use]
    pub fn current_user(&self) -> Option<UserProfile> {
        self.state.container().read(|s| s.user.clone())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn begin_authenticating(&self) -> SessionStatus {
        self.state.container().update(|s| {
            std::mem::replace(&mut s.session, SessionStatus::Authenticating)
        })
    }

    fn abort_authenticating(&self, previous: SessionStatus) {
        self.state.container().update(|s| {
            if s.session == SessionStatus::Authenticating {
                s.session = previous;
            }
        });
    }

    async fn fetch_document(&self, uid: &UserId) -> Result<Option<UserDocument>> {
        get_typed(self.state.store(), &DocumentPath::user(uid))
            .await
            .map_err(ClientError::RemoteReadFailed)
    }

    async fn enter_session(&self, document: UserDocument) {
        let (uid, email) = (document.profile.uid.clone(), document.profile.email.clone());
        self.state.container().update(|s| s.load_document(document));
        self.state.persist_session().await;
        set_sentry_user(&uid, Some(email.as_str()));
    }
}

fn parse_email(user: &AuthenticatedUser) -> Result<Email> {
    Email::parse(&user.email).map_err(|_| ClientError::InvalidEmail)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::remote::DocumentStore;
    use crate::services::CartService;
    use crate::services::test_support::{harness, product, signed_in};

    fn password() -> SecretString {
        SecretString::from("hunter22")
    }

    #[tokio::test]
    async fn test_register_writes_fresh_document() {
        let h = signed_in().await;
        let session = SessionService::new(&h.state);

        assert_eq!(session.status(), SessionStatus::Authenticated);
        let user = session.current_user().unwrap();
        assert_eq!(user.name, "Asha");

        let remote: UserDocument = get_typed(h.store.as_ref(), &DocumentPath::user(&user.uid))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(remote.profile, user);
        assert!(remote.cart.is_empty());
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let h = signed_in().await;
        SessionService::new(&h.state).logout().await.unwrap();

        let err = SessionService::new(&h.state)
            .register(RegisterRequest {
                name: "Other".to_string(),
                user_name: "other".to_string(),
                email: "asha@example.com".to_string(),
                password: password(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::DuplicateEmail));
        assert_eq!(SessionService::new(&h.state).status(), SessionStatus::Anonymous);
    }

    #[tokio::test]
    async fn test_logout_then_login_reloads_remote_state() {
        let h = signed_in().await;
        CartService::new(&h.state)
            .increase_quantity(&product(1, 10))
            .await
            .unwrap();
        let session = SessionService::new(&h.state);

        session.logout().await.unwrap();
        let state = h.state.snapshot();
        assert!(!state.is_logged_in());
        assert!(state.cart.is_empty());
        assert!(state.show_splash);

        session.login("asha@example.com", &password()).await.unwrap();
        assert_eq!(h.state.snapshot().cart.item_count(), 1);
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let h = signed_in().await;
        let session = SessionService::new(&h.state);
        session.logout().await.unwrap();

        let err = session
            .login("asha@example.com", &SecretString::from("nope-nope"))
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::WrongPassword));
        assert_eq!(session.status(), SessionStatus::Anonymous);
    }

    #[tokio::test]
    async fn test_login_without_document_is_profile_missing() {
        let h = signed_in().await;
        let session = SessionService::new(&h.state);
        let uid = session.current_user().unwrap().uid;
        session.logout().await.unwrap();
        h.store
            .set(&DocumentPath::user(&uid), Value::Null)
            .await
            .unwrap();

        let err = session
            .login("asha@example.com", &password())
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::ProfileMissing(id) if id == uid));
        assert!(h.state.identity().current_user().await.is_none());
        assert_eq!(session.status(), SessionStatus::Anonymous);
    }

    #[tokio::test]
    async fn test_sync_without_identity_session() {
        let h = harness();
        let outcome = SessionService::new(&h.state).sync_user_data().await.unwrap();
        assert_eq!(outcome, SyncOutcome::NoSession);
    }

    #[tokio::test]
    async fn test_sync_replaces_local_collections() {
        let h = signed_in().await;
        let session = SessionService::new(&h.state);
        h.state.container().update(|s| {
            s.cart.increase(&product(9, 1));
        });

        assert_eq!(session.sync_user_data().await.unwrap(), SyncOutcome::Synced);
        assert!(h.state.snapshot().cart.is_empty());
    }

    #[tokio::test]
    async fn test_update_profile_photo() {
        let h = signed_in().await;
        let session = SessionService::new(&h.state);

        session
            .update_profile_photo("https://img.example.com/a.png")
            .await
            .unwrap();

        let user = session.current_user().unwrap();
        assert_eq!(user.photo_url, "https://img.example.com/a.png");
        let remote = h
            .store
            .get(&DocumentPath::user_field(&user.uid, field::PHOTO_URL))
            .await
            .unwrap();
        assert_eq!(remote, Some(Value::String(user.photo_url.clone())));
    }

    #[tokio::test]
    async fn test_theme_survives_logout() {
        let h = signed_in().await;
        let session = SessionService::new(&h.state);

        assert_eq!(session.toggle_theme(None).await, ThemeMode::Light);
        session.logout().await.unwrap();
        assert_eq!(h.state.snapshot().theme, ThemeMode::Light);
    }
}
