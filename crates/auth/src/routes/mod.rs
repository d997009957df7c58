//! Route handlers for the auth service.
//!
//! # Routes
//!
//! ## Verification codes
//! - `POST /api/auth/send-verification` - Email a code to a shopper
//! - `POST /api/auth/verify-code` - Redeem a shopper code for a session
//! - `POST /api/auth/admin/send-verification` - Email a code to the administrator
//! - `POST /api/auth/admin/verify-code` - Redeem an administrator code
//!
//! ## Sessions
//! - `POST /api/auth/refresh` - Re-sign a valid token
//! - `GET /api/protected/profile` - Claims of the presented token
//!
//! ## Legacy (deprecated)
//! - `POST /api/auth/signup`
//! - `POST /api/auth/login`
//!
//! ## Health
//! - `GET /live`, `GET /ready`, `GET /health`

pub mod health;
pub mod legacy;
pub mod token;
pub mod verification;

use axum::Router;

use crate::middleware::rate_limit::RateLimiterLayer;
use crate::state::AppState;

/// Build the complete router without burst throttling.
pub fn routes() -> Router<AppState> {
    build(verification::router())
}

/// Build the complete router with `throttle` wrapping the verification routes.
pub fn routes_with_throttle(throttle: RateLimiterLayer) -> Router<AppState> {
    build(verification::router().layer(throttle))
}

fn build(verification: Router<AppState>) -> Router<AppState> {
    Router::new()
        .merge(verification)
        .merge(token::router())
        .merge(legacy::router())
        .merge(health::router())
}
