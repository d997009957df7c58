//! Cart repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use madeinworld_core::{CartLineId, MiniAppType, Money, ProductId, UserId};

use super::RepositoryError;
use crate::models::{CartKey, CartLine, Product};
use crate::services::CartStore;

const PRODUCT_COLUMNS: &str =
    "id, sku, title, main_price, stock_left, minimum_order_quantity, is_active";

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    sku: String,
    title: String,
    main_price: Money,
    stock_left: i32,
    minimum_order_quantity: i32,
    is_active: bool,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            sku: row.sku,
            title: row.title,
            main_price: row.main_price,
            stock_left: row.stock_left,
            minimum_order_quantity: row.minimum_order_quantity,
            is_active: row.is_active,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    line_id: CartLineId,
    user_id: UserId,
    mini_app_type: MiniAppType,
    quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[sqlx(flatten)]
    product: ProductRow,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        Self {
            id: row.line_id,
            user_id: row.user_id,
            mini_app_type: row.mini_app_type,
            quantity: row.quantity,
            product: row.product.into(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for cart lines.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl CartStore for CartRepository<'_> {
    async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    async fn line_quantity(&self, key: &CartKey) -> Result<Option<i32>, RepositoryError> {
        let quantity: Option<i32> = sqlx::query_scalar(
            "SELECT quantity FROM carts \
             WHERE user_id = $1 AND mini_app_type = $2 AND product_id = $3",
        )
        .bind(key.user_id)
        .bind(key.mini_app_type)
        .bind(key.product_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(quantity)
    }

    async fn add_quantity(&self, key: &CartKey, quantity: i32) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO carts (id, user_id, mini_app_type, product_id, quantity) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (user_id, mini_app_type, product_id) \
             DO UPDATE SET quantity = carts.quantity + EXCLUDED.quantity, updated_at = now()",
        )
        .bind(CartLineId::generate())
        .bind(key.user_id)
        .bind(key.mini_app_type)
        .bind(key.product_id)
        .bind(quantity)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    async fn set_quantity(&self, key: &CartKey, quantity: i32) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE carts SET quantity = $4, updated_at = now() \
             WHERE user_id = $1 AND mini_app_type = $2 AND product_id = $3",
        )
        .bind(key.user_id)
        .bind(key.mini_app_type)
        .bind(key.product_id)
        .bind(quantity)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_line(&self, key: &CartKey) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM carts WHERE user_id = $1 AND mini_app_type = $2 AND product_id = $3",
        )
        .bind(key.user_id)
        .bind(key.mini_app_type)
        .bind(key.product_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn lines(
        &self,
        user_id: UserId,
        mini_app_type: MiniAppType,
    ) -> Result<Vec<CartLine>, RepositoryError> {
        let rows: Vec<CartLineRow> = sqlx::query_as(
            "SELECT c.id AS line_id, c.user_id, c.mini_app_type, c.quantity, \
                    c.created_at, c.updated_at, \
                    p.id, p.sku, p.title, p.main_price, p.stock_left, \
                    p.minimum_order_quantity, p.is_active \
             FROM carts c \
             JOIN products p ON p.id = c.product_id \
             WHERE c.user_id = $1 AND c.mini_app_type = $2 \
             ORDER BY c.created_at DESC",
        )
        .bind(user_id)
        .bind(mini_app_type)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(CartLine::from).collect())
    }
}
