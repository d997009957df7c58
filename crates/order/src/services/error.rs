//! Cart, checkout, and order administration errors.

use thiserror::Error;

use madeinworld_core::{MiniAppType, OrderStatus, ProductId, StockShortfall};

use crate::db::RepositoryError;

/// Errors from cart mutations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Quantity outside the accepted range for the operation.
    #[error("quantity must be at least {min}, got {got}")]
    InvalidQuantity { min: i32, got: i32 },

    /// Location-based storefronts need a store on additions.
    #[error("store_id is required for {0}")]
    StoreRequired(MiniAppType),

    #[error("product not found")]
    ProductNotFound,

    /// Cart quantity would exceed display stock.
    #[error(
        "insufficient stock: requested {}, available {}, in cart {}",
        .0.requested,
        .0.available,
        .0.current
    )]
    InsufficientStock(StockShortfall),

    /// The product is delisted.
    #[error("product is not available")]
    ProductUnavailable,

    #[error("cart item not found")]
    LineNotFound,

    #[error("cart total overflow")]
    Overflow,

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Errors from turning a cart into an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    /// A line exceeds the product's current display stock.
    #[error("insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: i32,
        available: i32,
    },

    /// A line references a delisted product.
    #[error("product {product_id} is no longer available")]
    ProductUnavailable { product_id: ProductId },

    #[error("order total overflow")]
    Overflow,

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Errors from reading orders or changing their status.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Caller is not the configured administrator.
    #[error("administrator access required")]
    Forbidden,

    #[error("order not found")]
    NotFound,

    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}
