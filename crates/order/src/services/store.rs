//! Persistence seams for carts and orders.
//!
//! `PostgreSQL` repositories implement these in production; tests use
//! in-memory stores.

use std::future::Future;

use madeinworld_core::{MiniAppType, OrderId, OrderStatus, ProductId, UserId};

use crate::db::RepositoryError;
use crate::models::{CartKey, CartLine, NewOrder, Order, Product};

/// Cart lines and the product rows they reference.
pub trait CartStore: Send + Sync {
    fn product(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<Option<Product>, RepositoryError>> + Send;

    /// Quantity currently held in the line, if it exists.
    fn line_quantity(
        &self,
        key: &CartKey,
    ) -> impl Future<Output = Result<Option<i32>, RepositoryError>> + Send;

    /// Add `quantity` to the line, creating it if absent.
    fn add_quantity(
        &self,
        key: &CartKey,
        quantity: i32,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Overwrite the line's quantity. Returns false if the line is absent.
    fn set_quantity(
        &self,
        key: &CartKey,
        quantity: i32,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Delete the line. Returns false if it was absent.
    fn remove_line(
        &self,
        key: &CartKey,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Every line for the user in one storefront, newest first, joined with
    /// the current product rows.
    fn lines(
        &self,
        user_id: UserId,
        mini_app_type: MiniAppType,
    ) -> impl Future<Output = Result<Vec<CartLine>, RepositoryError>> + Send;
}

/// Order persistence.
pub trait OrderStore: Send + Sync {
    /// Write the order and all its items, and delete the ordered cart lines,
    /// in one transaction. Nothing is persisted on error.
    ///
    /// A cart line is deleted only while its quantity still equals the
    /// ordered quantity; a line changed since assembly is kept.
    fn place_order(
        &self,
        order: &NewOrder,
    ) -> impl Future<Output = Result<Order, RepositoryError>> + Send;

    /// The user's orders in one storefront, newest first.
    fn orders_for(
        &self,
        user_id: UserId,
        mini_app_type: MiniAppType,
    ) -> impl Future<Output = Result<Vec<Order>, RepositoryError>> + Send;

    fn order(
        &self,
        id: OrderId,
    ) -> impl Future<Output = Result<Option<Order>, RepositoryError>> + Send;

    /// Move the order from `from` to `to`. Returns `None` if the order was no
    /// longer in `from`.
    fn transition_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> impl Future<Output = Result<Option<Order>, RepositoryError>> + Send;
}
