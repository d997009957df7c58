//! Route handlers for the order service.
//!
//! All routes except health require `Authorization: Bearer <token>`.
//!
//! # Routes
//!
//! ## Cart
//! - `GET /api/cart/{mini_app_type}` - View cart with product snapshots
//! - `POST /api/cart/{mini_app_type}/add` - Add units (stock-checked)
//! - `PUT /api/cart/{mini_app_type}/update` - Set quantity; 0 removes
//! - `DELETE /api/cart/{mini_app_type}/remove/{product_id}` - Remove line
//!
//! ## Orders
//! - `POST /api/orders/{mini_app_type}` - Checkout
//! - `GET /api/orders/{mini_app_type}` - Order history
//! - `GET /api/order/{order_id}` - Single order
//!
//! ## Admin
//! - `PUT /api/admin/orders/{order_id}/status` - Status transition
//!
//! ## Health
//! - `GET /live`, `GET /ready`, `GET /health`

pub mod admin;
pub mod cart;
pub mod health;
pub mod orders;

use axum::Router;

use crate::state::AppState;

/// Build the complete router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(cart::router())
        .merge(orders::router())
        .merge(admin::router())
        .merge(health::router())
}
