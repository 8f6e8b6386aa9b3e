//! `PostgreSQL`-backed document store.
//!
//! Each user is one row in `shopmate.user_document` holding the whole
//! `users/{uid}` subtree as `jsonb`. Child writes go through `jsonb_set`, so
//! only paths one level below the user root are supported, which covers
//! every collection the client writes.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use tracing::instrument;

use super::{DocumentPath, DocumentStore, StoreError};

/// Document store over a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a small pool to `database_url`.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the database cannot be reached.
    pub async fn connect(database_url: &SecretString) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url.expose_secret())
            .await?;
        Ok(Self::new(pool))
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    #[instrument(skip(self), fields(path = %path))]
    async fn get(&self, path: &DocumentPath) -> Result<Option<Value>, StoreError> {
        let (uid, rest) = path
            .split_user()
            .ok_or_else(|| StoreError::UnsupportedPath(path.clone()))?;

        let row: Option<(Option<Json<Value>>,)> = sqlx::query_as(
            "SELECT document #> $2::text[] FROM shopmate.user_document WHERE user_id = $1",
        )
        .bind(uid)
        .bind(rest)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row
            .and_then(|(value,)| value)
            .map(|Json(value)| value)
            .filter(|value| !value.is_null()))
    }

    #[instrument(skip(self, value), fields(path = %path))]
    async fn set(&self, path: &DocumentPath, value: Value) -> Result<(), StoreError> {
        let (uid, rest) = path
            .split_user()
            .ok_or_else(|| StoreError::UnsupportedPath(path.clone()))?;

        match (rest, value.is_null()) {
            ([], true) => {
                sqlx::query("DELETE FROM shopmate.user_document WHERE user_id = $1")
                    .bind(uid)
                    .execute(&self.pool)
                    .await?;
            }
            ([], false) => {
                sqlx::query(
                    r"
                    INSERT INTO shopmate.user_document (user_id, document)
                    VALUES ($1, $2)
                    ON CONFLICT (user_id) DO UPDATE
                    SET document = EXCLUDED.document, updated_at = now()
                    ",
                )
                .bind(uid)
                .bind(Json(&value))
                .execute(&self.pool)
                .await?;
            }
            ([_], true) => {
                sqlx::query(
                    r"
                    UPDATE shopmate.user_document
                    SET document = document #- $2::text[], updated_at = now()
                    WHERE user_id = $1
                    ",
                )
                .bind(uid)
                .bind(rest)
                .execute(&self.pool)
                .await?;
            }
            ([_], false) => {
                sqlx::query(
                    r"
                    INSERT INTO shopmate.user_document (user_id, document)
                    VALUES ($1, jsonb_set('{}'::jsonb, $2::text[], $3, true))
                    ON CONFLICT (user_id) DO UPDATE
                    SET document = jsonb_set(shopmate.user_document.document, $2::text[], $3, true),
                        updated_at = now()
                    ",
                )
                .bind(uid)
                .bind(rest)
                .bind(Json(&value))
                .execute(&self.pool)
                .await?;
            }
            _ => return Err(StoreError::UnsupportedPath(path.clone())),
        }

        Ok(())
    }
}
