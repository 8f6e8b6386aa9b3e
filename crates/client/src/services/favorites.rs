//! Favorites service.

use shopmate_core::{FavoriteOutcome, NotificationDraft, ProductId, ProductRef};
use tracing::{debug, instrument};

use super::{NotificationService, mirror};
use crate::error::{ClientError, Result, add_breadcrumb};
use crate::remote::field;
use crate::state::AppState;

/// Favorite toggling for the signed-in user.
pub struct FavoritesService<'a> {
    state: &'a AppState,
}

impl<'a> FavoritesService<'a> {
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Add the product to favorites, or remove it if already there.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NoActiveSession` if nobody is signed in, or
    /// `ClientError::RemoteWriteFailed` if the remote copy could not be
    /// updated (the local toggle stands).
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn toggle_favorite(&self, product: &ProductRef) -> Result<FavoriteOutcome> {
        let (uid, outcome, favorites) = self.state.container().try_update(|s| {
            let uid = s.current_uid().cloned().ok_or(ClientError::NoActiveSession)?;
            let outcome = s.favorites.toggle(product);
            Ok::<_, ClientError>((uid, outcome, s.favorites.clone()))
        })?;

        debug!(?outcome, count = favorites.len(), "Favorites toggled");
        add_breadcrumb(
            "favorites",
            "Toggled favorite",
            Some(&[("product_id", &product.id.to_string())]),
        );

        mirror(self.state, &uid, field::FAVORITES, &favorites).await?;

        let draft = match outcome {
            FavoriteOutcome::Added => NotificationDraft::favorite_added(&product.name),
            FavoriteOutcome::Removed => NotificationDraft::favorite_removed(&product.name),
        };
        NotificationService::new(self.state).notify(draft).await;

        Ok(outcome)
    }

    #[must_use]
    pub fn is_favorite(&self, id: ProductId) -> bool {
        self.state.container().read(|s| s.favorites.contains(id))
    }

    /// Favorites in insertion order.
    #[must_use]
    pub fn favorites(&self) -> Vec<ProductRef> {
        self.state
            .container()
            .read(|s| s.favorites.entries().to_vec())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::services::test_support::{harness, product, signed_in};

    #[tokio::test]
    async fn test_toggle_twice_restores_favorites() {
        let h = signed_in().await;
        let service = FavoritesService::new(&h.state);
        let p = product(7, 30);

        assert_eq!(service.toggle_favorite(&p).await.unwrap(), FavoriteOutcome::Added);
        assert!(service.is_favorite(p.id));

        h.clock.advance(Duration::seconds(1));
        assert_eq!(service.toggle_favorite(&p).await.unwrap(), FavoriteOutcome::Removed);
        assert!(service.favorites().is_empty());

        let titles: Vec<_> = h
            .state
            .snapshot()
            .notifications
            .entries()
            .iter()
            .map(|n| n.title.clone())
            .collect();
        assert_eq!(titles.len(), 3);
    }

    #[tokio::test]
    async fn test_toggle_without_session() {
        let h = harness();
        let result = FavoritesService::new(&h.state)
            .toggle_favorite(&product(1, 1))
            .await;

        assert!(matches!(result, Err(ClientError::NoActiveSession)));
        assert!(h.state.snapshot().favorites.is_empty());
    }
}
