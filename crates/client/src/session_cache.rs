//! Encrypted on-disk session snapshot.
//!
//! Keeps the signed-in profile, theme and splash flag across restarts so the
//! app can show the last user immediately and reconcile with the remote
//! store afterwards. The file holds `nonce || ciphertext` sealed with
//! AES-256-GCM.

use std::path::{Path, PathBuf};

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use shopmate_core::{ThemeMode, UserProfile};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::{SESSION_CACHE_KEY_VAR, validate_secret_strength};

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

/// Errors reading or writing the session snapshot.
#[derive(Debug, Error)]
pub enum SessionCacheError {
    #[error("invalid session key: {0}")]
    InvalidKey(String),

    #[error("session file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Wrong key, or the file was tampered with or truncated.
    #[error("session file could not be decrypted")]
    Decrypt,

    #[error("session encryption failed")]
    Encrypt,

    #[error("session snapshot is malformed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// What survives a restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    pub user: Option<UserProfile>,
    #[serde(default)]
    pub theme: ThemeMode,
    #[serde(default = "default_show_splash")]
    pub show_splash: bool,
}

const fn default_show_splash() -> bool {
    true
}

impl Default for PersistedSession {
    fn default() -> Self {
        Self {
            user: None,
            theme: ThemeMode::default(),
            show_splash: true,
        }
    }
}

/// Reads and writes the encrypted snapshot file.
pub struct SessionCache {
    path: PathBuf,
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for SessionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCache")
            .field("path", &self.path)
            .field("cipher", &"[REDACTED]")
            .finish()
    }
}

impl SessionCache {
    /// Create a cache at `path` with a base64-encoded 32-byte key.
    ///
    /// # Errors
    ///
    /// Returns `SessionCacheError::InvalidKey` if the key is not valid
    /// base64 or not 32 bytes long.
    pub fn new(path: impl Into<PathBuf>, key: &SecretString) -> Result<Self, SessionCacheError> {
        let bytes = STANDARD
            .decode(key.expose_secret().trim())
            .map_err(|e| SessionCacheError::InvalidKey(e.to_string()))?;
        if bytes.len() != KEY_LEN {
            return Err(SessionCacheError::InvalidKey(format!(
                "expected {KEY_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let cipher = Aes256Gcm::new_from_slice(&bytes)
            .map_err(|e| SessionCacheError::InvalidKey(e.to_string()))?;

        Ok(Self {
            path: path.into(),
            cipher,
        })
    }

    /// A fresh random key, base64-encoded.
    ///
    /// Keys whose encoding trips the config secret checks (a placeholder
    /// word such as `todo` spelled out by chance) are drawn again.
    #[must_use]
    pub fn generate_key() -> SecretString {
        let mut bytes = [0u8; KEY_LEN];
        loop {
            rand::rng().fill_bytes(&mut bytes);
            let key = STANDARD.encode(bytes);
            if validate_secret_strength(&key, SESSION_CACHE_KEY_VAR).is_ok() {
                return SecretString::from(key);
            }
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot, or `None` if no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decrypted.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn load(&self) -> Result<Option<PersistedSession>, SessionCacheError> {
        let sealed = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let plaintext = self.open(&sealed)?;
        let session = serde_json::from_slice(&plaintext)?;
        debug!("Session snapshot loaded");
        Ok(Some(session))
    }

    /// Overwrite the snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    #[instrument(skip(self, session), fields(path = %self.path.display()))]
    pub async fn save(&self, session: &PersistedSession) -> Result<(), SessionCacheError> {
        let plaintext = serde_json::to_vec(session)?;
        let sealed = self.seal(&plaintext)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, sealed).await?;
        debug!("Session snapshot saved");
        Ok(())
    }

    /// Remove the snapshot file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub async fn clear(&self) -> Result<(), SessionCacheError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, SessionCacheError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| SessionCacheError::Encrypt)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, SessionCacheError> {
        let (nonce, ciphertext) = sealed
            .split_at_checked(NONCE_LEN)
            .ok_or(SessionCacheError::Decrypt)?;
        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| SessionCacheError::Decrypt)
    }
}
