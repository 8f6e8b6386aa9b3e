//! Order service: order creation and checkout.

use rand::Rng;
use rust_decimal::Decimal;
use shopmate_core::{
    CartLine, CartTotals, DeliveryTier, NotificationDraft, Order, OrderBook, OrderId, OrderStatus,
    Price, PromoCode,
};
use tracing::{info, instrument, warn};

use super::{CartService, NotificationService, mirror, require_uid};
use crate::error::{ClientError, Result, add_breadcrumb};
use crate::remote::{DocumentPath, field, get_typed};
use crate::state::AppState;

/// Upper bound (exclusive) for the numeric part of generated order ids.
const ORDER_NUMBER_RANGE: u32 = 1_000_000;

/// What the shopper chose on the checkout screen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CheckoutRequest {
    pub tier: DeliveryTier,
    /// Promo code as typed; `None` or blank for no code.
    pub promo_code: Option<String>,
}

/// The placed order and the totals it was charged at.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutReceipt {
    pub order: Order,
    pub totals: CartTotals,
}

/// Orders for the signed-in user.
pub struct OrderService<'a> {
    state: &'a AppState,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Record an order under `order_id`.
    ///
    /// Reads the remote order map, inserts the order (replacing any order
    /// with the same id), writes the map back and then mirrors the order
    /// locally.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NoActiveSession` if nobody is signed in,
    /// `ClientError::RemoteReadFailed` if the remote map could not be read,
    /// or `ClientError::RemoteWriteFailed` if it could not be written. Local
    /// state is untouched in both remote cases.
    #[instrument(skip(self, items), fields(order_id = %order_id))]
    pub async fn create_order(
        &self,
        order_id: OrderId,
        total: Decimal,
        items: Vec<CartLine>,
    ) -> Result<Order> {
        let uid = require_uid(self.state)?;
        let path = DocumentPath::user_field(&uid, field::ORDERS);

        let mut orders: OrderBook = get_typed(self.state.store(), &path)
            .await
            .map_err(ClientError::RemoteReadFailed)?
            .unwrap_or_default();

        let order = Order::place(order_id, total, items, self.state.clock().now());
        if orders.upsert(order.clone()).is_some() {
            warn!("Order id already existed; overwriting");
        }

        mirror(self.state, &uid, field::ORDERS, &orders).await?;

        self.state.container().update(|s| {
            if s.current_uid() == Some(&uid) {
                s.orders.upsert(order.clone());
            }
        });

        info!(total = %order.total, "Order placed");
        add_breadcrumb("orders", "Order placed", Some(&[("order_id", order.order_id.as_str())]));

        NotificationService::new(self.state)
            .notify(NotificationDraft::order_placed(
                &order.order_id,
                Price::store(order.total),
            ))
            .await;

        Ok(order)
    }

    /// Price the cart, place it as a new order and empty the cart.
    ///
    /// The order id is `ORD-` followed by a random number below one million.
    /// If the cart cannot be cleared remotely afterwards the order still
    /// stands and the failure is logged.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NoActiveSession` if nobody is signed in,
    /// `ClientError::EmptyCart` if the cart has no lines,
    /// `ClientError::Pricing` for an unknown promo code, or any error from
    /// [`Self::create_order`].
    #[instrument(skip(self))]
    pub async fn checkout(&self, request: CheckoutRequest) -> Result<CheckoutReceipt> {
        let cart = self
            .state
            .container()
            .read(|s| s.current_uid().map(|_| s.cart.clone()))
            .ok_or(ClientError::NoActiveSession)?;
        if cart.is_empty() {
            return Err(ClientError::EmptyCart);
        }

        let promo = request
            .promo_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(PromoCode::parse)
            .transpose()?;

        let totals = self.state.config().pricing.totals(&cart, request.tier, promo);
        let order_id = OrderId::from_number(rand::rng().random_range(0..ORDER_NUMBER_RANGE));

        let order = self
            .create_order(order_id, totals.grand_total.round_dp(2), cart.into_lines())
            .await?;

        if let Err(e) = CartService::new(self.state).clear_cart().await {
            warn!(error = %e, "Order placed but cart could not be cleared remotely");
        }

        Ok(CheckoutReceipt { order, totals })
    }

    /// Orders with `status`, or all orders for `None`; newest first.
    #[must_use]
    pub fn orders(&self, status: Option<OrderStatus>) -> Vec<Order> {
        self.state
            .container()
            .read(|s| s.orders.by_status(status).into_iter().cloned().collect())
    }

    #[must_use]
    pub fn order(&self, id: &OrderId) -> Option<Order> {
        self.state.container().read(|s| s.orders.get(id).cloned())
    }
}
