//! Cart routes. Every route is scoped to the authenticated shopper.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, post, put},
};
use serde::Deserialize;

use madeinworld_core::{MiniAppType, ProductId};

use crate::db::CartRepository;
use crate::error::{Result, within};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireUser;
use crate::models::{CartKey, CartView};
use crate::services::CartLedger;
use crate::state::AppState;

/// Body of an add-to-cart request.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub quantity: i32,
    /// Required for location-based storefronts.
    #[serde(default)]
    pub store_id: Option<i64>,
}

/// Body of an update request. Quantity 0 removes the line.
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Build the cart router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/cart/{mini_app_type}", get(view_cart))
        .route("/api/cart/{mini_app_type}/add", post(add_to_cart))
        .route("/api/cart/{mini_app_type}/update", put(update_cart))
        .route(
            "/api/cart/{mini_app_type}/remove/{product_id}",
            delete(remove_from_cart),
        )
}

async fn view_cart(
    State(state): State<AppState>,
    user: RequireUser,
    ApiPath(mini_app_type): ApiPath<MiniAppType>,
) -> Result<Json<CartView>> {
    let carts = CartRepository::new(state.pool());
    let ledger = CartLedger::new(&carts);

    let view = within(
        state.config().request_timeout,
        ledger.view(user.id, mini_app_type),
    )
    .await?;
    Ok(Json(view))
}

async fn add_to_cart(
    State(state): State<AppState>,
    user: RequireUser,
    ApiPath(mini_app_type): ApiPath<MiniAppType>,
    ApiJson(body): ApiJson<AddToCartRequest>,
) -> Result<(StatusCode, Json<CartView>)> {
    let carts = CartRepository::new(state.pool());
    let ledger = CartLedger::new(&carts);
    let key = CartKey {
        user_id: user.id,
        mini_app_type,
        product_id: body.product_id,
    };

    let view = within(state.config().request_timeout, async {
        ledger.add(&key, body.quantity, body.store_id).await?;
        ledger.view(user.id, mini_app_type).await
    })
    .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn update_cart(
    State(state): State<AppState>,
    user: RequireUser,
    ApiPath(mini_app_type): ApiPath<MiniAppType>,
    ApiJson(body): ApiJson<UpdateCartRequest>,
) -> Result<Json<CartView>> {
    let carts = CartRepository::new(state.pool());
    let ledger = CartLedger::new(&carts);
    let key = CartKey {
        user_id: user.id,
        mini_app_type,
        product_id: body.product_id,
    };

    let view = within(state.config().request_timeout, async {
        ledger.update(&key, body.quantity).await?;
        ledger.view(user.id, mini_app_type).await
    })
    .await?;
    Ok(Json(view))
}

async fn remove_from_cart(
    State(state): State<AppState>,
    user: RequireUser,
    ApiPath((mini_app_type, product_id)): ApiPath<(MiniAppType, ProductId)>,
) -> Result<Json<CartView>> {
    let carts = CartRepository::new(state.pool());
    let ledger = CartLedger::new(&carts);
    let key = CartKey {
        user_id: user.id,
        mini_app_type,
        product_id,
    };

    let view = within(state.config().request_timeout, async {
        ledger.remove(&key).await?;
        ledger.view(user.id, mini_app_type).await
    })
    .await?;
    Ok(Json(view))
}
