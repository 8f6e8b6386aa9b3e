//! Cart service.

use shopmate_core::{
    Cart, CartChange, CartTotals, DeliveryTier, NotificationDraft, ProductId, ProductRef,
    PromoCode,
};
use tracing::{debug, instrument};

use super::{NotificationService, mirror};
use crate::error::{ClientError, Result, add_breadcrumb};
use crate::remote::field;
use crate::state::AppState;

/// Cart reducer for the signed-in user.
pub struct CartService<'a> {
    state: &'a AppState,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Add one of `product`: a new line at quantity 1, or one more on the
    /// existing line.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NoActiveSession` if nobody is signed in, or
    /// `ClientError::RemoteWriteFailed` if the remote cart could not be
    /// updated (the local change stands).
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn increase_quantity(&self, product: &ProductRef) -> Result<CartChange> {
        let (uid, change, cart) = self.state.container().try_update(|s| {
            let uid = s.current_uid().cloned().ok_or(ClientError::NoActiveSession)?;
            let change = s.cart.increase(product);
            Ok::<_, ClientError>((uid, change, s.cart.clone()))
        })?;

        debug!(?change, items = cart.item_count(), "Cart increased");
        add_breadcrumb(
            "cart",
            "Increased quantity",
            Some(&[("product_id", &product.id.to_string())]),
        );

        mirror(self.state, &uid, field::CART, &cart).await?;

        let draft = match change {
            CartChange::QuantityChanged(quantity) => {
                NotificationDraft::cart_updated(&product.name, quantity)
            }
            CartChange::Added | CartChange::Removed => NotificationDraft::cart_added(&product.name),
        };
        NotificationService::new(self.state).notify(draft).await;

        Ok(change)
    }

    /// Take one off the product's line; a line at quantity 1 is removed.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NoActiveSession` if nobody is signed in,
    /// `ClientError::ItemNotFound` if the product has no line, or
    /// `ClientError::RemoteWriteFailed` if the remote cart could not be
    /// updated.
    #[instrument(skip(self))]
    pub async fn decrease_quantity(&self, product_id: ProductId) -> Result<CartChange> {
        let (uid, change, cart) = self.state.container().try_update(|s| {
            let uid = s.current_uid().cloned().ok_or(ClientError::NoActiveSession)?;
            let change = s.cart.decrease(product_id)?;
            Ok::<_, ClientError>((uid, change, s.cart.clone()))
        })?;

        debug!(?change, items = cart.item_count(), "Cart decreased");
        mirror(self.state, &uid, field::CART, &cart).await?;
        Ok(change)
    }

    /// Remove the product's line, or empty the whole cart for `None`.
    ///
    /// Removing a product that is not in the cart leaves it unchanged but
    /// still rewrites the remote copy.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NoActiveSession` if nobody is signed in, or
    /// `ClientError::RemoteWriteFailed` if the remote cart could not be
    /// updated.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, product_id: Option<ProductId>) -> Result<()> {
        let (uid, cart) = self.state.container().try_update(|s| {
            let uid = s.current_uid().cloned().ok_or(ClientError::NoActiveSession)?;
            s.cart.remove(product_id);
            Ok::<_, ClientError>((uid, s.cart.clone()))
        })?;

        debug!(lines = cart.len(), "Cart item removed");
        mirror(self.state, &uid, field::CART, &cart).await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Same as [`Self::remove_item`].
    pub async fn clear_cart(&self) -> Result<()> {
        self.remove_item(None).await
    }

    /// The current cart.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.state.container().read(|s| s.cart.clone())
    }

    /// Sum of quantities, for the cart badge.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.state.container().read(|s| s.cart.item_count())
    }

    /// Price the current cart with the configured pricing policy.
    #[must_use]
    pub fn totals(&self, tier: DeliveryTier, promo: Option<PromoCode>) -> CartTotals {
        let pricing = self.state.config().pricing;
        self.state
            .container()
            .read(|s| pricing.totals(&s.cart, tier, promo))
    }
}
