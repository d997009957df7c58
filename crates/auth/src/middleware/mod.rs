//! HTTP middleware and extractors for auth.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS
//! 5. Rate limiting (governor, verification routes only)

pub mod auth;
pub mod client_ip;
pub mod rate_limit;
pub mod request_id;

pub use auth::{BearerToken, RequireSession};
pub use client_ip::{ClientIp, resolve_client_ip};
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
