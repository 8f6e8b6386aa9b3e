//! In-process identity provider with Argon2id password hashes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use shopmate_core::{Email, UserId};
use tokio::sync::RwLock;
use tracing::instrument;

use super::{AuthenticatedUser, IdentityError, IdentityProvider, ProfileUpdate};

/// Minimum password length accepted at sign-up.
pub const MIN_PASSWORD_LENGTH: usize = 6;

// Argon2id cost for locally held accounts.
const MEMORY_COST_KIB: u32 = 1024;
const TIME_COST: u32 = 1;

#[derive(Debug, Clone)]
struct Account {
    uid: UserId,
    email: String,
    password_hash: String,
    display_name: Option<String>,
    photo_url: Option<String>,
}

impl Account {
    fn to_user(&self) -> AuthenticatedUser {
        AuthenticatedUser {
            uid: self.uid.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            photo_url: self.photo_url.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct Accounts {
    by_email: HashMap<String, Account>,
    current: Option<String>,
}

/// Accounts held in memory, keyed by normalized email.
pub struct InMemoryIdentityProvider {
    accounts: RwLock<Accounts>,
    argon2: Argon2<'static>,
    failing_sign_out: AtomicBool,
}

impl std::fmt::Debug for InMemoryIdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryIdentityProvider")
            .field("accounts", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryIdentityProvider {
    #[must_use]
    pub fn new() -> Self {
        let argon2 = Params::new(MEMORY_COST_KIB, TIME_COST, 1, None).map_or_else(
            |_| Argon2::default(),
            |params| Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        );
        Self {
            accounts: RwLock::new(Accounts::default()),
            argon2,
            failing_sign_out: AtomicBool::new(false),
        }
    }

    /// Number of registered accounts.
    pub async fn account_count(&self) -> usize {
        self.accounts.read().await.by_email.len()
    }

    /// Make every sign-out fail, leaving the current user signed in, until
    /// switched off again.
    pub fn fail_sign_out(&self, fail: bool) {
        self.failing_sign_out.store(fail, Ordering::SeqCst);
    }

    fn hash_password(&self, password: &str) -> Result<String, IdentityError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| IdentityError::Other(format!("password hashing failed: {e}")))
    }

    fn verify_password(&self, password: &str, hash: &str) -> Result<(), IdentityError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|_| IdentityError::WrongPassword)?;
        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| IdentityError::WrongPassword)
    }
}

fn normalize_email(email: &str) -> Result<String, IdentityError> {
    Email::parse(email)
        .map(|e| e.as_str().to_lowercase())
        .map_err(|_| IdentityError::InvalidEmail)
}

fn validate_password(password: &str) -> Result<(), IdentityError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(IdentityError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    #[instrument(skip(self, password))]
    async fn create_user_with_email_and_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthenticatedUser, IdentityError> {
        let key = normalize_email(email)?;
        validate_password(password.expose_secret())?;
        let password_hash = self.hash_password(password.expose_secret())?;

        let mut accounts = self.accounts.write().await;
        if accounts.by_email.contains_key(&key) {
            return Err(IdentityError::EmailAlreadyInUse);
        }

        let account = Account {
            uid: UserId::new(uuid::Uuid::new_v4().simple().to_string()),
            email: key.clone(),
            password_hash,
            display_name: None,
            photo_url: None,
        };
        let user = account.to_user();
        accounts.by_email.insert(key.clone(), account);
        accounts.current = Some(key);
        drop(accounts);

        tracing::debug!(uid = %user.uid, "Account created");
        Ok(user)
    }

    #[instrument(skip(self, password))]
    async fn sign_in_with_email_and_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthenticatedUser, IdentityError> {
        let key = normalize_email(email)?;

        let mut accounts = self.accounts.write().await;
        let account = accounts
            .by_email
            .get(&key)
            .ok_or(IdentityError::UserNotFound)?;
        self.verify_password(password.expose_secret(), &account.password_hash)?;
        let user = account.to_user();
        accounts.current = Some(key);
        drop(accounts);

        Ok(user)
    }

    async fn update_profile(&self, update: ProfileUpdate) -> Result<(), IdentityError> {
        let mut accounts = self.accounts.write().await;
        let Accounts { by_email, current } = &mut *accounts;
        let account = current
            .as_ref()
            .and_then(|key| by_email.get_mut(key))
            .ok_or(IdentityError::NotSignedIn)?;

        match update {
            ProfileUpdate::DisplayName(name) => account.display_name = Some(name),
            ProfileUpdate::PhotoUrl(url) => account.photo_url = Some(url),
        }
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        if self.failing_sign_out.load(Ordering::SeqCst) {
            return Err(IdentityError::Other("sign-out unavailable".to_string()));
        }
        self.accounts.write().await.current = None;
        Ok(())
    }

    async fn current_user(&self) -> Option<AuthenticatedUser> {
        let accounts = self.accounts.read().await;
        accounts
            .current
            .as_ref()
            .and_then(|key| accounts.by_email.get(key))
            .map(Account::to_user)
    }
}
