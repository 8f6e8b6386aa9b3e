//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `SHOPMATE_CATALOG_URL` - Product catalog endpoint
//! - `SHOPMATE_CATALOG_CACHE_TTL_SECS` - Catalog cache lifetime (default: 300)
//! - `SHOPMATE_SESSION_CACHE_PATH` - Encrypted session snapshot file
//! - `SHOPMATE_SESSION_CACHE_KEY` - Base64 AES-256 key for the snapshot
//!   (required when the path is set; high entropy)
//! - `SHOPMATE_PRICING_PRESET` - `checkout` (default) or `cart_summary`
//! - `SHOPMATE_TAX_RATE` - Override the preset's tax rate (e.g., 0.18)
//! - `SHOPMATE_FEE_STANDARD`, `SHOPMATE_FEE_EXPRESS`, `SHOPMATE_FEE_SAME_DAY` -
//!   Override the preset's delivery fees
//! - `SHOPMATE_REMOTE_WRITE_ATTEMPTS` - Attempts per remote write (default: 3)
//! - `SHOPMATE_REMOTE_RETRY_BASE_MS` - First retry delay (default: 200)
//! - `SHOPMATE_DATABASE_URL` - `PostgreSQL` URL for the document store
//!   (falls back to `DATABASE_URL`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::SecretString;
use shopmate_core::PricingPolicy;
use thiserror::Error;
use url::Url;

use crate::sync::{DEFAULT_RETRY_BASE_MS, DEFAULT_WRITE_ATTEMPTS, SyncPolicy};

pub const DEFAULT_CATALOG_URL: &str = "https://backend.ecom.subraatakumar.com/api/v1/allproducts";
pub const DEFAULT_CATALOG_CACHE_TTL: Duration = Duration::from_secs(300);
pub const SESSION_CACHE_KEY_VAR: &str = "SHOPMATE_SESSION_CACHE_KEY";

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub catalog: CatalogConfig,
    /// Encrypted session snapshot; `None` keeps the session in memory only.
    pub session_cache: Option<SessionCacheConfig>,
    pub pricing: PricingPolicy,
    pub sync: SyncPolicy,
    /// `PostgreSQL` URL for the document store (contains password)
    pub database_url: Option<SecretString>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
}

/// Catalog endpoint configuration.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub url: Url,
    pub cache_ttl: Duration,
}

/// Session snapshot location and key.
///
/// Implements `Debug` manually to redact the key.
#[derive(Clone)]
pub struct SessionCacheConfig {
    pub path: PathBuf,
    /// Base64-encoded 32-byte AES-256-GCM key
    pub key: SecretString,
}

impl std::fmt::Debug for SessionCacheConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCacheConfig")
            .field("path", &self.path)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: default_catalog_url(),
            cache_ttl: DEFAULT_CATALOG_CACHE_TTL,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig::default(),
            session_cache: None,
            pricing: PricingPolicy::default(),
            sync: SyncPolicy::default(),
            database_url: None,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is malformed, if the session
    /// cache path is set without a key, or if the key fails validation
    /// (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let catalog = CatalogConfig::from_env()?;
        let session_cache = SessionCacheConfig::from_env()?;
        let pricing = pricing_from_env()?;
        let sync = SyncPolicy {
            max_attempts: parse_env_or("SHOPMATE_REMOTE_WRITE_ATTEMPTS", DEFAULT_WRITE_ATTEMPTS)?,
            base_delay: Duration::from_millis(parse_env_or(
                "SHOPMATE_REMOTE_RETRY_BASE_MS",
                DEFAULT_RETRY_BASE_MS,
            )?),
        };
        let database_url = get_database_url("SHOPMATE_DATABASE_URL");
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(Self {
            catalog,
            session_cache,
            pricing,
            sync,
            database_url,
            sentry_dsn,
            sentry_environment,
        })
    }
}

impl CatalogConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let url = match get_optional_env("SHOPMATE_CATALOG_URL") {
            Some(raw) => Url::parse(&raw).map_err(|e| {
                ConfigError::InvalidEnvVar("SHOPMATE_CATALOG_URL".to_string(), e.to_string())
            })?,
            None => default_catalog_url(),
        };
        let ttl_secs = parse_env_or(
            "SHOPMATE_CATALOG_CACHE_TTL_SECS",
            DEFAULT_CATALOG_CACHE_TTL.as_secs(),
        )?;

        Ok(Self {
            url,
            cache_ttl: Duration::from_secs(ttl_secs),
        })
    }
}

impl SessionCacheConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(path) = get_optional_env("SHOPMATE_SESSION_CACHE_PATH") else {
            return Ok(None);
        };
        let key = get_validated_secret(SESSION_CACHE_KEY_VAR)?;
        Ok(Some(Self {
            path: PathBuf::from(path),
            key,
        }))
    }
}

fn pricing_from_env() -> Result<PricingPolicy, ConfigError> {
    let mut policy = match get_env_or_default("SHOPMATE_PRICING_PRESET", "checkout").as_str() {
        "checkout" => PricingPolicy::checkout(),
        "cart_summary" => PricingPolicy::cart_summary(),
        other => {
            return Err(ConfigError::InvalidEnvVar(
                "SHOPMATE_PRICING_PRESET".to_string(),
                format!("unknown preset '{other}' (expected checkout or cart_summary)"),
            ));
        }
    };

    if let Some(rate) = parse_optional_env::<Decimal>("SHOPMATE_TAX_RATE")? {
        policy.tax_rate = rate;
    }
    if let Some(fee) = parse_optional_env::<Decimal>("SHOPMATE_FEE_STANDARD")? {
        policy.delivery_fees.standard = fee;
    }
    if let Some(fee) = parse_optional_env::<Decimal>("SHOPMATE_FEE_EXPRESS")? {
        policy.delivery_fees.express = fee;
    }
    if let Some(fee) = parse_optional_env::<Decimal>("SHOPMATE_FEE_SAME_DAY")? {
        policy.delivery_fees.same_day = fee;
    }

    policy.validate().map_err(|e| {
        ConfigError::InvalidEnvVar("SHOPMATE_PRICING_PRESET".to_string(), e.to_string())
    })?;
    Ok(policy)
}

fn default_catalog_url() -> Url {
    // The constant is a valid absolute URL.
    Url::parse(DEFAULT_CATALOG_URL).unwrap_or_else(|_| unreachable!("invalid default catalog URL"))
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Option<SecretString> {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an optional environment variable.
fn parse_optional_env<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
        .transpose()
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(parse_optional_env(key)?.unwrap_or(default))
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
pub(crate) fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use `shopmate keygen`."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-session-key", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_base64_key() {
        let result =
            validate_secret_strength("q3N8v+0bT1ZkR4mWc2Lh9sYpEaJf6GiUoX7nKdQe5Bw=", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.catalog.url.as_str(), DEFAULT_CATALOG_URL);
        assert_eq!(config.catalog.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.pricing, PricingPolicy::checkout());
        assert_eq!(config.sync.max_attempts, 3);
        assert!(config.session_cache.is_none());
    }

    #[test]
    fn test_session_cache_debug_redacts_key() {
        let config = SessionCacheConfig {
            path: PathBuf::from("/tmp/session.bin"),
            key: SecretString::from("q3N8v+0bT1ZkR4mWc2Lh9sYpEaJf6GiUoX7nKdQe5Bw="),
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("q3N8"));
    }
}
