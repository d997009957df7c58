//! MadeInWorld Order service library.
//!
//! Per-storefront carts validated against buffered display stock, atomic
//! checkout into immutable orders, order history, and administrative status
//! transitions. Session tokens are minted by the auth service and only
//! verified here.

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
