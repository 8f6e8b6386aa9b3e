//! Remote document store.
//!
//! User data lives in a tree keyed by `users/{uid}`; each collection is a
//! child node that is always overwritten as a whole. Concrete backends
//! implement [`DocumentStore`]; [`InMemoryDocumentStore`] is the default
//! and [`PgDocumentStore`] persists the tree in `PostgreSQL`.

mod memory;
#[cfg(feature = "postgres")]
mod postgres;

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shopmate_core::UserId;
use thiserror::Error;

pub use memory::InMemoryDocumentStore;
#[cfg(feature = "postgres")]
pub use postgres::PgDocumentStore;

/// Child node names under `users/{uid}`.
pub mod field {
    pub const FAVORITES: &str = "favorites";
    pub const CART: &str = "cart";
    pub const NOTIFICATIONS: &str = "notifications";
    pub const ORDERS: &str = "orders";
    pub const PHOTO_URL: &str = "photoURL";
}

const USERS_ROOT: &str = "users";

/// Errors from a document store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached or timed out.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The backend refused the operation.
    #[error("permission denied for {0}")]
    PermissionDenied(DocumentPath),

    /// The path cannot be expressed by this backend.
    #[error("unsupported path: {0}")]
    UnsupportedPath(DocumentPath),

    /// A stored value did not have the expected shape.
    #[error("malformed document at {path}: {source}")]
    Decode {
        path: DocumentPath,
        #[source]
        source: serde_json::Error,
    },

    /// A value could not be encoded for storage.
    #[error("failed to encode value: {0}")]
    Encode(#[source] serde_json::Error),

    #[cfg(feature = "postgres")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Whether retrying the same call could succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Unavailable(_) => true,
            #[cfg(feature = "postgres")]
            Self::Database(_) => true,
            _ => false,
        }
    }
}

/// A slash-separated path into the remote tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    segments: Vec<String>,
}

impl DocumentPath {
    /// `users/{uid}`
    #[must_use]
    pub fn user(uid: &UserId) -> Self {
        Self {
            segments: vec![USERS_ROOT.to_string(), uid.as_str().to_string()],
        }
    }

    /// `users/{uid}/{field}`
    #[must_use]
    pub fn user_field(uid: &UserId, field: &str) -> Self {
        Self::user(uid).child(field)
    }

    /// This path with one more segment appended.
    #[must_use]
    pub fn child(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The user id and the remaining segments, for paths under `users/`.
    #[must_use]
    pub fn split_user(&self) -> Option<(&str, &[String])> {
        match self.segments.as_slice() {
            [root, uid, rest @ ..] if root == USERS_ROOT => Some((uid.as_str(), rest)),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// A remote tree of JSON values.
///
/// Writes replace the whole subtree at `path`; writing `null` removes it.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read the value at `path`, or `None` if nothing is stored there.
    async fn get(&self, path: &DocumentPath) -> Result<Option<Value>, StoreError>;

    /// Overwrite the value at `path`.
    async fn set(&self, path: &DocumentPath, value: Value) -> Result<(), StoreError>;
}

/// Read and decode a typed value.
///
/// # Errors
///
/// Returns the backend error, or `StoreError::Decode` if the stored value
/// does not match `T`.
pub async fn get_typed<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    path: &DocumentPath,
) -> Result<Option<T>, StoreError> {
    store
        .get(path)
        .await?
        .map(|value| {
            serde_json::from_value(value).map_err(|source| StoreError::Decode {
                path: path.clone(),
                source,
            })
        })
        .transpose()
}

/// Encode a value for storage.
///
/// # Errors
///
/// Returns `StoreError::Encode` if `value` cannot be represented as JSON.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Value, StoreError> {
    serde_json::to_value(value).map_err(StoreError::Encode)
}
