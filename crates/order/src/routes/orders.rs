//! Checkout and order history routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;

use madeinworld_core::{MiniAppType, OrderId};

use crate::db::{CartRepository, OrderRepository};
use crate::error::{Result, within};
use crate::extract::ApiPath;
use crate::middleware::RequireUser;
use crate::models::Order;
use crate::services::{CheckoutService, OrderService};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct OrderList {
    pub orders: Vec<Order>,
}

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/orders/{mini_app_type}", post(checkout).get(list_orders))
        .route("/api/order/{order_id}", get(get_order))
}

/// Place an order from the caller's cart in this storefront.
async fn checkout(
    State(state): State<AppState>,
    user: RequireUser,
    ApiPath(mini_app_type): ApiPath<MiniAppType>,
) -> Result<(StatusCode, Json<Order>)> {
    let carts = CartRepository::new(state.pool());
    let orders = OrderRepository::new(state.pool());
    let service = CheckoutService::new(&carts, &orders);

    let order = within(
        state.config().request_timeout,
        service.checkout(user.id, mini_app_type),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn list_orders(
    State(state): State<AppState>,
    user: RequireUser,
    ApiPath(mini_app_type): ApiPath<MiniAppType>,
) -> Result<Json<OrderList>> {
    let orders = OrderRepository::new(state.pool());
    let service = OrderService::new(&orders);

    let orders = within(
        state.config().request_timeout,
        service.history(user.id, mini_app_type),
    )
    .await?;
    Ok(Json(OrderList { orders }))
}

async fn get_order(
    State(state): State<AppState>,
    user: RequireUser,
    ApiPath(order_id): ApiPath<OrderId>,
) -> Result<Json<Order>> {
    let orders = OrderRepository::new(state.pool());
    let service = OrderService::new(&orders);

    let order = within(
        state.config().request_timeout,
        service.get_for_user(user.id, order_id),
    )
    .await?;
    Ok(Json(order))
}
