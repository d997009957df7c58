//! HTTP middleware and extractors for orders.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS

pub mod auth;
pub mod request_id;

pub use auth::{RequireSession, RequireUser};
pub use request_id::request_id_middleware;
