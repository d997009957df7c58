//! Business logic services for orders.
//!
//! # Services
//!
//! - `cart` - Cart & stock ledger (soft stock check on add)
//! - `checkout` - Order assembler (hard stock check, atomic write)
//! - `orders` - Order history and administrative status changes

pub mod cart;
pub mod checkout;
mod error;
pub mod orders;
pub mod store;

#[cfg(test)]
pub(crate) mod memory;

pub use cart::CartLedger;
pub use checkout::{CheckoutService, assemble_order};
pub use error::{CartError, CheckoutError, OrderError};
pub use orders::OrderService;
pub use store::{CartStore, OrderStore};
