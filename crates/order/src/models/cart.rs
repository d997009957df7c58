//! Cart lines and the cart view returned to clients.

use chrono::{DateTime, Utc};
use serde::Serialize;

use madeinworld_core::{CartLineId, MiniAppType, Money, ProductId, UserId};

use super::product::{Product, ProductSnapshot};

/// Identity of a cart line: one per user, storefront, and product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CartKey {
    pub user_id: UserId,
    pub mini_app_type: MiniAppType,
    pub product_id: ProductId,
}

/// A stored cart line joined with the current product row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub id: CartLineId,
    pub user_id: UserId,
    pub mini_app_type: MiniAppType,
    /// Always at least 1 while the line exists.
    pub quantity: i32,
    pub product: Product,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    pub id: CartLineId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub product: ProductSnapshot,
    /// `quantity` at today's price.
    pub line_total: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user's cart in one storefront, priced at current product prices.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub mini_app_type: MiniAppType,
    pub items: Vec<CartLineView>,
    pub total_items: i64,
    pub total_amount: Money,
}

impl CartView {
    /// Price `lines` at their current product prices.
    ///
    /// Returns `None` if a line total overflows.
    #[must_use]
    pub fn price(mini_app_type: MiniAppType, lines: &[CartLine]) -> Option<Self> {
        let mut items = Vec::with_capacity(lines.len());
        let mut total_amount = Money::ZERO;
        let mut total_items = 0_i64;

        for line in lines {
            let line_total = line.product.main_price.times(line.quantity)?;
            total_amount = total_amount.checked_add(line_total)?;
            total_items += i64::from(line.quantity);
            items.push(CartLineView {
                id: line.id,
                product_id: line.product.id,
                quantity: line.quantity,
                product: ProductSnapshot::from(&line.product),
                line_total,
                created_at: line.created_at,
                updated_at: line.updated_at,
            });
        }

        Some(Self {
            mini_app_type,
            items,
            total_items,
            total_amount,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(price: &str, quantity: i32) -> CartLine {
        let now = Utc::now();
        CartLine {
            id: CartLineId::generate(),
            user_id: UserId::generate(),
            mini_app_type: MiniAppType::RetailStore,
            quantity,
            product: Product {
                id: ProductId::generate(),
                sku: "SKU-1".to_owned(),
                title: "Tea".to_owned(),
                main_price: Money::new(price.parse().unwrap()),
                stock_left: 20,
                minimum_order_quantity: 1,
                is_active: true,
            },
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_cart_totals() {
        let lines = [line("2.50", 2), line("0.99", 3)];
        let view = CartView::price(MiniAppType::RetailStore, &lines).unwrap();

        assert_eq!(view.total_items, 5);
        assert_eq!(view.total_amount, Money::new("7.97".parse().unwrap()));
        assert_eq!(view.items[1].line_total, Money::new("2.97".parse().unwrap()));
        assert_eq!(view.items[0].product.display_stock, 15);
    }

    #[test]
    fn test_empty_cart_view() {
        let view = CartView::price(MiniAppType::GroupBuying, &[]).unwrap();
        assert!(view.items.is_empty());
        assert_eq!(view.total_amount, Money::ZERO);
    }
}
