//! Administrative order status changes.

use axum::{Json, Router, extract::State, routing::put};
use serde::Deserialize;

use madeinworld_core::{OrderId, OrderStatus};

use crate::db::OrderRepository;
use crate::error::{Result, within};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireSession;
use crate::models::Order;
use crate::services::OrderService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// Build the admin router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/admin/orders/{order_id}/status", put(update_status))
}

async fn update_status(
    State(state): State<AppState>,
    RequireSession(claims): RequireSession,
    ApiPath(order_id): ApiPath<OrderId>,
    ApiJson(body): ApiJson<UpdateStatusRequest>,
) -> Result<Json<Order>> {
    let orders = OrderRepository::new(state.pool());
    let service = OrderService::new(&orders);

    let order = within(
        state.config().request_timeout,
        service.update_status(
            state.config().admin_email.as_ref(),
            &claims,
            order_id,
            body.status,
        ),
    )
    .await?;
    Ok(Json(order))
}
