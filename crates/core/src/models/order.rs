//! Orders placed at checkout.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::cart::CartLine;
use crate::types::{OrderId, OrderStatus};

/// A snapshot of the cart at checkout time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: OrderId,
    pub items: Vec<CartLine>,
    pub total: Decimal,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub status: OrderStatus,
}

impl Order {
    /// A freshly placed order, in `Processing`.
    #[must_use]
    pub fn place(
        order_id: OrderId,
        total: Decimal,
        items: Vec<CartLine>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            order_id,
            items,
            total,
            created_at: now,
            status: OrderStatus::Processing,
        }
    }
}

/// Orders keyed by order id, as stored remotely.
///
/// Inserting an id that already exists replaces the earlier order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderBook {
    orders: BTreeMap<OrderId, Order>,
}

impl OrderBook {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            orders: BTreeMap::new(),
        }
    }

    /// Insert or replace by `order.order_id`. Returns the replaced order.
    pub fn upsert(&mut self, order: Order) -> Option<Order> {
        self.orders.insert(order.order_id.clone(), order)
    }

    #[must_use]
    pub fn get(&self, id: &OrderId) -> Option<&Order> {
        self.orders.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Orders, newest first.
    #[must_use]
    pub fn newest_first(&self) -> Vec<&Order> {
        let mut orders: Vec<&Order> = self.orders.values().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }

    /// Orders matching a status, or all orders for `None`; newest first.
    #[must_use]
    pub fn by_status(&self, status: Option<OrderStatus>) -> Vec<&Order> {
        self.newest_first()
            .into_iter()
            .filter(|order| status.is_none_or(|s| order.status == s))
            .collect()
    }
}
