//! Core domain types for MadeInWorld.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod mini_app;
pub mod money;
pub mod status;
pub mod stock;

pub use email::{Email, EmailError};
pub use id::*;
pub use mini_app::{MiniAppType, UnknownMiniAppType};
pub use money::Money;
pub use status::{OrderStatus, UnknownOrderStatus};
pub use stock::{DISPLAY_STOCK_BUFFER, StockShortfall, check_cart_addition, display_stock};
