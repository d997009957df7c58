//! MadeInWorld Auth service library.
//!
//! Passwordless email verification codes for shoppers and the administrator,
//! stateless session tokens, and the deprecated password endpoints. The
//! binary in `main.rs` wires this library into an HTTP server; integration
//! tests drive the same router directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
