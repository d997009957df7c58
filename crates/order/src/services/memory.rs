//! In-memory `CartStore` / `OrderStore` for service tests.

#![allow(clippy::unwrap_used, clippy::significant_drop_tightening)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};

use madeinworld_core::{
    CartLineId, MiniAppType, Money, OrderId, OrderStatus, ProductId, UserId,
};

use super::store::{CartStore, OrderStore};
use crate::db::RepositoryError;
use crate::models::{CartKey, CartLine, NewOrder, Order, Product};

struct StoredLine {
    id: CartLineId,
    key: CartKey,
    quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Default)]
pub(crate) struct MemoryShop {
    products: Mutex<HashMap<ProductId, Product>>,
    lines: Mutex<Vec<StoredLine>>,
    orders: Mutex<Vec<Order>>,
    /// When set, `place_order` fails as if the transaction aborted.
    pub(crate) fail_place: AtomicBool,
}

impl MemoryShop {
    /// Insert a product with `price` and raw stock `stock`.
    pub(crate) fn stock(&self, price: &str, stock: i32) -> ProductId {
        let id = ProductId::generate();
        self.products.lock().unwrap().insert(
            id,
            Product {
                id,
                sku: format!("SKU-{}", &id.to_string()[..8]),
                title: "Green tea".to_owned(),
                main_price: Money::new(price.parse().unwrap()),
                stock_left: stock,
                minimum_order_quantity: 1,
                is_active: true,
            },
        );
        id
    }

    pub(crate) fn edit_product(&self, id: ProductId, edit: impl FnOnce(&mut Product)) {
        edit(self.products.lock().unwrap().get_mut(&id).unwrap());
    }

    pub(crate) fn quantity(&self, key: &CartKey) -> Option<i32> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.key == *key)
            .map(|l| l.quantity)
    }

    pub(crate) fn line_count(&self) -> usize {
        self.lines.lock().unwrap().len()
    }

    pub(crate) fn order_count(&self) -> usize {
        self.orders.lock().unwrap().len()
    }
}

impl CartStore for MemoryShop {
    async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.products.lock().unwrap().get(&id).cloned())
    }

    async fn line_quantity(&self, key: &CartKey) -> Result<Option<i32>, RepositoryError> {
        Ok(self.quantity(key))
    }

    async fn add_quantity(&self, key: &CartKey, quantity: i32) -> Result<(), RepositoryError> {
        let now = Utc::now();
        let mut lines = self.lines.lock().unwrap();
        match lines.iter_mut().find(|l| l.key == *key) {
            Some(line) => {
                line.quantity += quantity;
                line.updated_at = now;
            }
            None => lines.push(StoredLine {
                id: CartLineId::generate(),
                key: *key,
                quantity,
                created_at: now,
                updated_at: now,
            }),
        }
        Ok(())
    }

    async fn set_quantity(&self, key: &CartKey, quantity: i32) -> Result<bool, RepositoryError> {
        let mut lines = self.lines.lock().unwrap();
        Ok(lines
            .iter_mut()
            .find(|l| l.key == *key)
            .map(|line| {
                line.quantity = quantity;
                line.updated_at = Utc::now();
            })
            .is_some())
    }

    async fn remove_line(&self, key: &CartKey) -> Result<bool, RepositoryError> {
        let mut lines = self.lines.lock().unwrap();
        let before = lines.len();
        lines.retain(|l| l.key != *key);
        Ok(lines.len() < before)
    }

    async fn lines(
        &self,
        user_id: UserId,
        mini_app_type: MiniAppType,
    ) -> Result<Vec<CartLine>, RepositoryError> {
        let products = self.products.lock().unwrap();
        let lines = self.lines.lock().unwrap();
        let mut out: Vec<CartLine> = lines
            .iter()
            .filter(|l| l.key.user_id == user_id && l.key.mini_app_type == mini_app_type)
            .map(|l| CartLine {
                id: l.id,
                user_id,
                mini_app_type,
                quantity: l.quantity,
                product: products[&l.key.product_id].clone(),
                created_at: l.created_at,
                updated_at: l.updated_at,
            })
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }
}

impl OrderStore for MemoryShop {
    async fn place_order(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        if self.fail_place.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }

        let now = Utc::now();
        let placed = Order {
            id: order.id,
            user_id: order.user_id,
            mini_app_type: order.mini_app_type,
            status: OrderStatus::Pending,
            total_amount: order.total_amount,
            created_at: now,
            updated_at: now,
            items: order.items.iter().map(|item| item.to_item()).collect(),
        };

        self.lines.lock().unwrap().retain(|l| {
            l.key.user_id != order.user_id
                || l.key.mini_app_type != order.mini_app_type
                || !order
                    .items
                    .iter()
                    .any(|i| i.product_id == l.key.product_id && i.quantity == l.quantity)
        });
        self.orders.lock().unwrap().push(placed.clone());
        Ok(placed)
    }

    async fn orders_for(
        &self,
        user_id: UserId,
        mini_app_type: MiniAppType,
    ) -> Result<Vec<Order>, RepositoryError> {
        let mut out: Vec<Order> = self
            .orders
            .lock()
            .unwrap()
            .iter()
            .filter(|o| o.user_id == user_id && o.mini_app_type == mini_app_type)
            .cloned()
            .collect();
        out.reverse();
        Ok(out)
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.orders.lock().unwrap().iter().find(|o| o.id == id).cloned())
    }

    async fn transition_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut orders = self.orders.lock().unwrap();
        Ok(orders
            .iter_mut()
            .find(|o| o.id == id && o.status == from)
            .map(|order| {
                order.status = to;
                order.updated_at = Utc::now();
                order.clone()
            }))
    }
}
