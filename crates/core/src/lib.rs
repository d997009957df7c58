//! MadeInWorld Core - Shared domain types.
//!
//! This crate provides the types shared by the MadeInWorld services:
//! - `auth` - Passwordless verification-code login and session tokens
//! - `order` - Carts, stock validation, and checkout
//! - `cli` - Operator tooling
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no database access,
//! no HTTP. The one exception is [`config`], which reads environment
//! variables. Session token signing lives here because both services need the
//! same claim layout and verification rules.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, money, storefront contexts, order status, stock
//! - [`session`] - Signed session token claims, minting, verification, refresh
//! - [`config`] - Environment lookups, signing-secret validation, Sentry settings

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod session;
pub mod types;

pub use session::{
    DEVELOPMENT_SECRET, IssuedToken, SessionClaims, SessionKeys, TokenError, bearer_token,
};
pub use types::*;
