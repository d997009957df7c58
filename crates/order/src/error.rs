//! Unified error handling with Sentry integration.
//!
//! Responses carry `{"error": "<kind>", "message": "<text>"}`. Conflicts add
//! a `reason` and, for stock problems, the numbers a client needs to adjust
//! the request.

use std::future::Future;
use std::time::Duration;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value, json};
use thiserror::Error;

use madeinworld_core::TokenError;

use crate::db::RepositoryError;
use crate::services::{CartError, CheckoutError, OrderError};

/// Application-level error type for the order service.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Malformed request payload or path.
    #[error("{0}")]
    Validation(String),

    /// Missing or malformed credentials.
    #[error("{0}")]
    Unauthorized(String),

    #[error("Request timed out")]
    Timeout,
}

impl AppError {
    /// HTTP status and machine-readable kind.
    #[must_use]
    pub const fn status_and_kind(&self) -> (StatusCode, &'static str) {
        const CONFLICT: (StatusCode, &str) = (StatusCode::CONFLICT, "conflict");
        const NOT_FOUND: (StatusCode, &str) = (StatusCode::NOT_FOUND, "not_found");
        const STORAGE: (StatusCode, &str) = (StatusCode::INTERNAL_SERVER_ERROR, "storage_error");
        const INTERNAL: (StatusCode, &str) = (StatusCode::INTERNAL_SERVER_ERROR, "internal_error");
        const INVALID: (StatusCode, &str) = (StatusCode::BAD_REQUEST, "validation_error");

        match self {
            Self::Cart(err) => match err {
                CartError::InvalidQuantity { .. } | CartError::StoreRequired(_) => INVALID,
                CartError::ProductNotFound | CartError::LineNotFound => NOT_FOUND,
                CartError::InsufficientStock(_) | CartError::ProductUnavailable => CONFLICT,
                CartError::Overflow => INTERNAL,
                CartError::Repository(_) => STORAGE,
            },
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart => (StatusCode::BAD_REQUEST, "empty_cart"),
                CheckoutError::InsufficientStock { .. }
                | CheckoutError::ProductUnavailable { .. } => CONFLICT,
                CheckoutError::Overflow => INTERNAL,
                CheckoutError::Repository(_) => STORAGE,
            },
            Self::Order(err) => match err {
                OrderError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
                OrderError::NotFound => NOT_FOUND,
                OrderError::InvalidTransition { .. } => CONFLICT,
                OrderError::Repository(_) => STORAGE,
            },
            Self::Token(TokenError::Signing(_)) => INTERNAL,
            Self::Token(_) | Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            Self::Database(_) => STORAGE,
            Self::Validation(_) => INVALID,
            Self::Timeout => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
        }
    }

    /// Conflict sub-kind and structured details, if any.
    fn details(&self) -> Option<(&'static str, Value)> {
        match self {
            Self::Cart(CartError::InsufficientStock(shortfall)) => {
                Some(("insufficient_stock", json!(shortfall)))
            }
            Self::Cart(CartError::ProductUnavailable) => Some(("product_unavailable", json!({}))),
            Self::Checkout(CheckoutError::InsufficientStock {
                product_id,
                requested,
                available,
            }) => Some((
                "insufficient_stock",
                json!({
                    "product_id": product_id,
                    "requested": requested,
                    "available": available,
                }),
            )),
            Self::Checkout(CheckoutError::ProductUnavailable { product_id }) => Some((
                "product_unavailable",
                json!({ "product_id": product_id }),
            )),
            Self::Order(OrderError::InvalidTransition { from, to }) => Some((
                "invalid_transition",
                json!({ "from": from, "to": to }),
            )),
            _ => None,
        }
    }

    /// Client-facing message. Server faults never expose their source text.
    fn public_message(&self) -> String {
        match self {
            Self::Cart(CartError::Overflow | CartError::Repository(_))
            | Self::Checkout(CheckoutError::Overflow | CheckoutError::Repository(_))
            | Self::Order(OrderError::Repository(_))
            | Self::Token(TokenError::Signing(_))
            | Self::Database(_) => "Internal server error".to_owned(),
            Self::Cart(err) => err.to_string(),
            Self::Checkout(err) => err.to_string(),
            Self::Order(err) => err.to_string(),
            Self::Token(TokenError::Expired) => "Token has expired".to_owned(),
            Self::Token(_) => "Invalid token".to_owned(),
            Self::Validation(msg) | Self::Unauthorized(msg) => msg.clone(),
            Self::Timeout => "Request timed out".to_owned(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                kind,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let mut body = Map::new();
        body.insert("error".to_owned(), json!(kind));
        body.insert("message".to_owned(), json!(self.public_message()));
        if let Some((reason, details)) = self.details() {
            body.insert("reason".to_owned(), json!(reason));
            if let Value::Object(fields) = details {
                body.extend(fields);
            }
        }

        (status, Json(Value::Object(body))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Run `fut` under `deadline`, mapping elapse to `AppError::Timeout`.
///
/// # Errors
///
/// Returns `AppError::Timeout` on elapse, otherwise the future's own error.
pub async fn within<T, E, F>(deadline: Duration, fut: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, E>>,
    AppError: From<E>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result.map_err(AppError::from),
        Err(_) => {
            tracing::warn!(deadline_ms = deadline.as_millis(), "Request deadline elapsed");
            Err(AppError::Timeout)
        }
    }
}

/// Associate subsequent Sentry events with the authenticated user.
pub fn set_sentry_user(user_id: &str, email: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_owned()),
            email: Some(email.to_owned()),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use madeinworld_core::{OrderStatus, ProductId, StockShortfall};

    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_add_shortfall_body() {
        let err = CartError::InsufficientStock(StockShortfall {
            requested: 4,
            available: 7,
            current: 4,
        });
        let (status, body) = body_json(err.into()).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "conflict");
        assert_eq!(body["reason"], "insufficient_stock");
        assert_eq!(body["requested"], 4);
        assert_eq!(body["available"], 7);
        assert_eq!(body["current"], 4);
    }

    #[tokio::test]
    async fn test_checkout_shortfall_names_product() {
        let product_id = ProductId::generate();
        let err = CheckoutError::InsufficientStock {
            product_id,
            requested: 5,
            available: 3,
        };
        let (status, body) = body_json(err.into()).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["product_id"], product_id.to_string());
    }

    #[tokio::test]
    async fn test_empty_cart_and_invalid_transition() {
        let (status, body) = body_json(CheckoutError::EmptyCart.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "empty_cart");
        assert_eq!(body["message"], "cart is empty");

        let err = OrderError::InvalidTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Cancelled,
        };
        let (status, body) = body_json(err.into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["reason"], "invalid_transition");
        assert_eq!(body["from"], "delivered");
    }

    #[tokio::test]
    async fn test_storage_errors_hide_details() {
        let err = CheckoutError::Repository(RepositoryError::Database(sqlx::Error::Protocol(
            "relation \"orders\" does not exist".to_owned(),
        )));
        let (status, body) = body_json(err.into()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "storage_error");
        assert_eq!(body["message"], "Internal server error");
    }

    #[test]
    fn test_status_codes() {
        fn status(err: impl Into<AppError>) -> StatusCode {
            err.into().status_and_kind().0
        }

        assert_eq!(status(CartError::LineNotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status(CartError::InvalidQuantity { min: 1, got: 0 }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status(CartError::ProductUnavailable), StatusCode::CONFLICT);
        assert_eq!(status(OrderError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(status(TokenError::Expired), StatusCode::UNAUTHORIZED);
        assert_eq!(status(AppError::Timeout), StatusCode::GATEWAY_TIMEOUT);
    }
}
