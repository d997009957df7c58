//! Domain models for the order service.

pub mod cart;
pub mod order;
pub mod product;

pub use cart::{CartKey, CartLine, CartLineView, CartView};
pub use order::{NewOrder, NewOrderItem, Order, OrderItem};
pub use product::{Product, ProductSnapshot};
