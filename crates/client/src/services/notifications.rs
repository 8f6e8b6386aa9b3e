//! Notification inbox service.

use shopmate_core::time::time_ago;
use shopmate_core::{Notification, NotificationDraft, NotificationId, NotificationLog};
use tracing::{debug, instrument, warn};

use super::mirror;
use crate::error::{ClientError, Result};
use crate::remote::field;
use crate::state::AppState;

/// Notification inbox for the signed-in user.
pub struct NotificationService<'a> {
    state: &'a AppState,
}

impl<'a> NotificationService<'a> {
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Stamp `draft` with the current time, append it and sync the log.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NoActiveSession` if nobody is signed in, or
    /// `ClientError::RemoteWriteFailed` if the remote log could not be
    /// updated (the local entry stands).
    #[instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn append(&self, draft: NotificationDraft) -> Result<Notification> {
        let now = self.state.clock().now();
        let (uid, notification, log) = self.state.container().try_update(|s| {
            let uid = s.current_uid().cloned().ok_or(ClientError::NoActiveSession)?;
            let notification = draft.into_notification(now);
            s.notifications.push(notification.clone());
            Ok::<_, ClientError>((uid, notification, s.notifications.clone()))
        })?;

        debug!(id = %notification.id, "Notification appended");
        mirror(self.state, &uid, field::NOTIFICATIONS, &log).await?;
        Ok(notification)
    }

    /// Append after another operation has already succeeded; failures are
    /// logged and dropped.
    pub(crate) async fn notify(&self, draft: NotificationDraft) {
        if let Err(e) = self.append(draft).await {
            warn!(error = %e, "Failed to record notification");
        }
    }

    /// Mark every entry with `id` as read.
    ///
    /// Returns `false`, without touching the remote log, if no entry has
    /// that id.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NoActiveSession` if nobody is signed in, or
    /// `ClientError::RemoteWriteFailed` if the remote log could not be
    /// updated.
    #[instrument(skip(self))]
    pub async fn mark_as_read(&self, id: NotificationId) -> Result<bool> {
        // Err(None) means no entry had the id; nothing changed.
        let marked = self.state.container().try_update(|s| {
            let uid = s
                .current_uid()
                .cloned()
                .ok_or(Some(ClientError::NoActiveSession))?;
            if s.notifications.mark_as_read(id) {
                Ok((uid, s.notifications.clone()))
            } else {
                Err(None)
            }
        });

        let (uid, log) = match marked {
            Ok(found) => found,
            Err(None) => return Ok(false),
            Err(Some(e)) => return Err(e),
        };

        mirror(self.state, &uid, field::NOTIFICATIONS, &log).await?;
        Ok(true)
    }

    /// Empty the inbox.
    ///
    /// The local log is always cleared. The remote log is cleared only when
    /// someone is signed in.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NoActiveSession` if nobody is signed in, or
    /// `ClientError::RemoteWriteFailed` if the remote log could not be
    /// cleared.
    #[instrument(skip(self))]
    pub async fn clear_all(&self) -> Result<()> {
        let uid = self.state.container().update(|s| {
            s.notifications.clear();
            s.current_uid().cloned()
        });
        let uid = uid.ok_or(ClientError::NoActiveSession)?;

        mirror(self.state, &uid, field::NOTIFICATIONS, &NotificationLog::new()).await
    }

    /// Notifications, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<Notification> {
        self.state
            .container()
            .read(|s| s.notifications.entries().to_vec())
    }

    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.state.container().read(|s| s.notifications.unread_count())
    }

    /// "3 mins ago" style label for a notification.
    #[must_use]
    pub fn time_ago(&self, notification: &Notification) -> String {
        time_ago(notification.timestamp, self.state.clock().now())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;
    use shopmate_core::NotificationDraft;

    use super::*;
    use crate::remote::{DocumentPath, DocumentStore};
    use crate::services::test_support::{harness, signed_in};

    fn draft(title: &str) -> NotificationDraft {
        NotificationDraft::new(title, "body", "bell")
    }

    #[tokio::test]
    async fn test_register_leaves_welcome_notification() {
        let h = signed_in().await;
        let service = NotificationService::new(&h.state);

        let entries = service.entries();
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].read);
        assert_eq!(service.unread_count(), 1);
    }

    #[tokio::test]
    async fn test_mark_as_read_syncs_remote() {
        let h = signed_in().await;
        h.clock.advance(Duration::seconds(5));
        let service = NotificationService::new(&h.state);
        let appended = service.append(draft("Hello")).await.unwrap();

        assert!(service.mark_as_read(appended.id).await.unwrap());
        assert_eq!(service.unread_count(), 1);

        let uid = h.state.snapshot().user.unwrap().uid;
        let remote: NotificationLog = crate::remote::get_typed(
            h.store.as_ref(),
            &DocumentPath::user_field(&uid, field::NOTIFICATIONS),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(remote, h.state.snapshot().notifications);
    }

    #[tokio::test]
    async fn test_mark_as_read_unknown_id_is_noop() {
        let h = signed_in().await;
        let writes = h.store.write_count();

        let marked = NotificationService::new(&h.state)
            .mark_as_read(NotificationId::new(42))
            .await
            .unwrap();

        assert!(!marked);
        assert_eq!(h.store.write_count(), writes);
    }

    #[tokio::test]
    async fn test_clear_all_empties_both_sides() {
        let h = signed_in().await;
        let service = NotificationService::new(&h.state);

        service.clear_all().await.unwrap();

        assert!(service.entries().is_empty());
        let uid = h.state.snapshot().user.unwrap().uid;
        let remote = h
            .store
            .get(&DocumentPath::user_field(&uid, field::NOTIFICATIONS))
            .await
            .unwrap();
        assert_eq!(remote, Some(serde_json::json!([])));
    }

    #[tokio::test]
    async fn test_append_without_session() {
        let h = harness();
        let result = NotificationService::new(&h.state).append(draft("Hi")).await;

        assert!(matches!(result, Err(ClientError::NoActiveSession)));
        assert!(h.state.snapshot().notifications.is_empty());
    }

    #[tokio::test]
    async fn test_time_ago_follows_clock() {
        let h = signed_in().await;
        let service = NotificationService::new(&h.state);
        let welcome = service.entries().remove(0);

        assert_eq!(service.time_ago(&welcome), "0 secs ago");
        h.clock.advance(Duration::minutes(3));
        assert_eq!(service.time_ago(&welcome), "3 mins ago");
    }
}
