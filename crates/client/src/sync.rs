//! Retry policy for remote writes.
//!
//! Every collection write is a full overwrite, so repeating a write is
//! idempotent and safe to retry. Local state is never rolled back when a
//! write finally fails.

use std::time::Duration;

use serde_json::Value;
use tracing::warn;

use crate::remote::{DocumentPath, DocumentStore, StoreError};

pub const DEFAULT_WRITE_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_BASE_MS: u64 = 200;

/// How many times to attempt a remote write, and how long to wait between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each later one.
    pub base_delay: Duration,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_WRITE_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_MS),
        }
    }
}

impl SyncPolicy {
    /// A single attempt.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay before attempt number `attempt` (1-based, so attempt 2 waits
    /// `base_delay`).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(2).min(16);
        self.base_delay.saturating_mul(1 << exponent)
    }

    /// Write `value` at `path`, retrying transient failures.
    ///
    /// # Errors
    ///
    /// Returns the last `StoreError` once attempts are exhausted, or the
    /// first non-transient one.
    pub async fn write(
        &self,
        store: &dyn DocumentStore,
        path: &DocumentPath,
        value: Value,
    ) -> Result<(), StoreError> {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match store.set(path, value.clone()).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_transient() && attempt < attempts => {
                    attempt += 1;
                    let delay = self.backoff(attempt);
                    warn!(%path, attempt, ?delay, error = %e, "Remote write failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use shopmate_core::UserId;

    use super::*;
    use crate::remote::{InMemoryDocumentStore, field};

    fn fast(attempts: u32) -> SyncPolicy {
        SyncPolicy {
            max_attempts: attempts,
            base_delay: Duration::from_millis(1),
        }
    }

    fn cart_path() -> DocumentPath {
        DocumentPath::user_field(&UserId::new("u-1"), field::CART)
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = fast(5);
        assert_eq!(policy.backoff(2), Duration::from_millis(1));
        assert_eq!(policy.backoff(3), Duration::from_millis(2));
        assert_eq!(policy.backoff(4), Duration::from_millis(4));
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let store = InMemoryDocumentStore::new();
        store.fail_next_writes(2);

        fast(3).write(&store, &cart_path(), json!([])).await.unwrap();
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let store = InMemoryDocumentStore::new();
        store.fail_next_writes(5);

        let err = fast(3).write(&store, &cart_path(), json!([])).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_no_retry_fails_fast() {
        let store = InMemoryDocumentStore::new();
        store.fail_next_writes(1);

        assert!(
            SyncPolicy::no_retry()
                .write(&store, &cart_path(), json!([]))
                .await
                .is_err()
        );
        assert_eq!(store.write_count(), 0);
    }
}
