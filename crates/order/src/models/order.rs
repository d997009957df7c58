//! Orders and their line snapshots.

use chrono::{DateTime, Utc};
use serde::Serialize;

use madeinworld_core::{MiniAppType, Money, OrderId, OrderItemId, OrderStatus, ProductId, UserId};

/// A placed order with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub mini_app_type: MiniAppType,
    pub status: OrderStatus,
    /// Sum of item totals at checkout. Never recomputed.
    pub total_amount: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

/// One order line, frozen at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub sku: String,
    pub title: String,
    pub quantity: i32,
    /// Product price read at checkout.
    pub unit_price: Money,
    pub total_price: Money,
}

/// An order ready to be written. Always `pending`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub id: OrderId,
    pub user_id: UserId,
    pub mini_app_type: MiniAppType,
    pub total_amount: Money,
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub sku: String,
    pub title: String,
    pub quantity: i32,
    pub unit_price: Money,
    pub total_price: Money,
}

impl NewOrderItem {
    /// The persisted form of this line.
    #[must_use]
    pub fn to_item(&self) -> OrderItem {
        OrderItem {
            id: self.id,
            product_id: self.product_id,
            sku: self.sku.clone(),
            title: self.title.clone(),
            quantity: self.quantity,
            unit_price: self.unit_price,
            total_price: self.total_price,
        }
    }
}
