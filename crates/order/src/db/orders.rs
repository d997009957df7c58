//! Order repository.
//!
//! `place_order` is the only multi-statement write in the service. It runs in
//! one transaction: dropping the transaction before `commit` (an error, the
//! request deadline, or a client disconnect cancelling the handler) rolls
//! everything back.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use madeinworld_core::{
    MiniAppType, Money, OrderId, OrderItemId, OrderStatus, ProductId, UserId,
};

use super::RepositoryError;
use crate::models::{NewOrder, Order, OrderItem};
use crate::services::OrderStore;

const ORDER_COLUMNS: &str =
    "id, user_id, mini_app_type, status, total_amount, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    mini_app_type: MiniAppType,
    status: OrderStatus,
    total_amount: Money,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn with_items(self, items: Vec<OrderItem>) -> Order {
        Order {
            id: self.id,
            user_id: self.user_id,
            mini_app_type: self.mini_app_type,
            status: self.status,
            total_amount: self.total_amount,
            created_at: self.created_at,
            updated_at: self.updated_at,
            items,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    order_id: OrderId,
    product_id: ProductId,
    sku: String,
    title: String,
    quantity: i32,
    unit_price: Money,
    total_price: Money,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            sku: row.sku,
            title: row.title,
            quantity: row.quantity,
            unit_price: row.unit_price,
            total_price: row.total_price,
        }
    }
}

/// Repository for orders and order items.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Attach items to `rows`, preserving row order.
    async fn hydrate(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id.as_uuid()).collect();
        let item_rows: Vec<OrderItemRow> = sqlx::query_as(
            "SELECT id, order_id, product_id, sku, title, quantity, unit_price, total_price \
             FROM order_items WHERE order_id = ANY($1) ORDER BY title, id",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for row in item_rows {
            by_order.entry(row.order_id).or_default().push(row.into());
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let items = by_order.remove(&row.id).unwrap_or_default();
                row.with_items(items)
            })
            .collect())
    }

    async fn hydrate_one(&self, row: Option<OrderRow>) -> Result<Option<Order>, RepositoryError> {
        Ok(self.hydrate(row.into_iter().collect()).await?.pop())
    }
}

impl OrderStore for OrderRepository<'_> {
    async fn place_order(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row: OrderRow = sqlx::query_as(&format!(
            "INSERT INTO orders (id, user_id, mini_app_type, status, total_amount) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order.id)
        .bind(order.user_id)
        .bind(order.mini_app_type)
        .bind(OrderStatus::Pending)
        .bind(order.total_amount)
        .fetch_one(&mut *tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                "INSERT INTO order_items \
                 (id, order_id, product_id, sku, title, quantity, unit_price, total_price) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(item.id)
            .bind(order.id)
            .bind(item.product_id)
            .bind(&item.sku)
            .bind(&item.title)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.total_price)
            .execute(&mut *tx)
            .await?;
        }

        let ordered: Vec<Uuid> = order.items.iter().map(|i| i.product_id.as_uuid()).collect();
        let quantities: Vec<i32> = order.items.iter().map(|i| i.quantity).collect();
        // A line edited since assembly no longer matches and stays in the cart.
        sqlx::query(
            "DELETE FROM carts c \
             USING unnest($3::uuid[], $4::int4[]) AS o(product_id, quantity) \
             WHERE c.user_id = $1 AND c.mini_app_type = $2 \
             AND c.product_id = o.product_id AND c.quantity = o.quantity",
        )
        .bind(order.user_id)
        .bind(order.mini_app_type)
        .bind(&ordered)
        .bind(&quantities)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(row.with_items(order.items.iter().map(|i| i.to_item()).collect()))
    }

    async fn orders_for(
        &self,
        user_id: UserId,
        mini_app_type: MiniAppType,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE user_id = $1 AND mini_app_type = $2 \
             ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .bind(mini_app_type)
        .fetch_all(self.pool)
        .await?;

        self.hydrate(rows).await
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        self.hydrate_one(row).await
    }

    async fn transition_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "UPDATE orders SET status = $3, updated_at = now() \
             WHERE id = $1 AND status = $2 \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_optional(self.pool)
        .await?;

        self.hydrate_one(row).await
    }
}
