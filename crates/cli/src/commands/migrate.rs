//! Document store migrations.
//!
//! # Usage
//!
//! ```bash
//! shopmate migrate
//! ```
//!
//! # Environment Variables
//!
//! - `SHOPMATE_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`)
//!
//! # Migration Files
//!
//! `crates/client/migrations/`

use shopmate_client::config::ClientConfig;
use shopmate_client::remote::PgDocumentStore;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Create or update the `shopmate.user_document` schema.
///
/// # Errors
///
/// Returns an error if no database URL is configured, the connection fails,
/// or a migration fails.
pub async fn run(config: &ClientConfig) -> Result<(), MigrationError> {
    let database_url = config
        .database_url
        .as_ref()
        .ok_or(MigrationError::MissingEnvVar("SHOPMATE_DATABASE_URL"))?;

    info!("Connecting to document store database...");
    let store = PgDocumentStore::connect(database_url).await?;

    info!("Running document store migrations...");
    sqlx::migrate!("../client/migrations").run(store.pool()).await?;

    info!("Document store migrations complete");
    Ok(())
}
