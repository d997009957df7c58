//! Stock-bearing product view.
//!
//! The catalog service owns products. The order service only reads price,
//! activity, and raw stock; it never decrements stock.

use serde::Serialize;

use madeinworld_core::{Money, ProductId, display_stock};

/// A product as seen by carts and checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub sku: String,
    pub title: String,
    /// Current unit price.
    pub main_price: Money,
    /// Raw inventory count. Never shown to customers.
    pub stock_left: i32,
    pub minimum_order_quantity: i32,
    /// False once delisted.
    pub is_active: bool,
}

impl Product {
    /// Customer-facing stock: raw stock minus the safety buffer, floored at zero.
    #[must_use]
    pub const fn display_stock(&self) -> i32 {
        display_stock(self.stock_left)
    }
}

/// Product fields embedded in cart responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub sku: String,
    pub title: String,
    pub main_price: Money,
    pub display_stock: i32,
    pub minimum_order_quantity: i32,
    pub is_active: bool,
}

impl From<&Product> for ProductSnapshot {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            sku: product.sku.clone(),
            title: product.title.clone(),
            main_price: product.main_price,
            display_stock: product.display_stock(),
            minimum_order_quantity: product.minimum_order_quantity,
            is_active: product.is_active,
        }
    }
}
