//! Order assembler.
//!
//! Checkout re-reads every cart line with the current product row, rejects
//! the whole cart on any stock or availability problem, then hands a fully
//! priced order to the store, which writes the order, its items, and the
//! cart deletion in one transaction.

use madeinworld_core::{MiniAppType, Money, OrderId, OrderItemId, UserId};

use super::error::CheckoutError;
use super::store::{CartStore, OrderStore};
use crate::models::{CartLine, NewOrder, NewOrderItem, Order};

/// Build a pending order from `lines`, capturing each product's current price.
///
/// All lines are checked for stock before any is checked for availability.
///
/// # Errors
///
/// - `EmptyCart` when `lines` is empty
/// - `InsufficientStock` naming the first line over display stock
/// - `ProductUnavailable` naming the first delisted product
/// - `Overflow` if a total does not fit
pub fn assemble_order(
    user_id: UserId,
    mini_app_type: MiniAppType,
    lines: &[CartLine],
) -> Result<NewOrder, CheckoutError> {
    if lines.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    if let Some(line) = lines
        .iter()
        .find(|l| l.quantity > l.product.display_stock())
    {
        return Err(CheckoutError::InsufficientStock {
            product_id: line.product.id,
            requested: line.quantity,
            available: line.product.display_stock(),
        });
    }

    if let Some(line) = lines.iter().find(|l| !l.product.is_active) {
        return Err(CheckoutError::ProductUnavailable {
            product_id: line.product.id,
        });
    }

    let items = lines
        .iter()
        .map(|line| {
            let unit_price = line.product.main_price;
            Ok(NewOrderItem {
                id: OrderItemId::generate(),
                product_id: line.product.id,
                sku: line.product.sku.clone(),
                title: line.product.title.clone(),
                quantity: line.quantity,
                unit_price,
                total_price: unit_price
                    .times(line.quantity)
                    .ok_or(CheckoutError::Overflow)?,
            })
        })
        .collect::<Result<Vec<_>, CheckoutError>>()?;

    let total_amount = items
        .iter()
        .try_fold(Money::ZERO, |acc, item| acc.checked_add(item.total_price))
        .ok_or(CheckoutError::Overflow)?;

    Ok(NewOrder {
        id: OrderId::generate(),
        user_id,
        mini_app_type,
        total_amount,
        items,
    })
}

/// Checkout for one request.
pub struct CheckoutService<'a, C, O> {
    carts: &'a C,
    orders: &'a O,
}

impl<'a, C: CartStore, O: OrderStore> CheckoutService<'a, C, O> {
    #[must_use]
    pub const fn new(carts: &'a C, orders: &'a O) -> Self {
        Self { carts, orders }
    }

    /// Turn the user's cart in `mini_app_type` into a pending order.
    ///
    /// # Errors
    ///
    /// See [`assemble_order`]; storage failures roll the whole write back.
    #[tracing::instrument(skip(self))]
    pub async fn checkout(
        &self,
        user_id: UserId,
        mini_app_type: MiniAppType,
    ) -> Result<Order, CheckoutError> {
        let lines = self.carts.lines(user_id, mini_app_type).await?;

        let new_order = assemble_order(user_id, mini_app_type, &lines).inspect_err(|e| {
            tracing::info!(error = %e, "Checkout rejected");
        })?;

        let order = self.orders.place_order(&new_order).await?;
        tracing::info!(
            order_id = %order.id,
            total_amount = %order.total_amount,
            items = order.items.len(),
            "Order placed"
        );
        Ok(order)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::Ordering;

    use madeinworld_core::{OrderStatus, ProductId};

    use super::*;
    use crate::models::CartKey;
    use crate::services::memory::MemoryShop;

    async fn fill(shop: &MemoryShop, user: UserId, lines: &[(ProductId, i32)]) {
        for (product_id, quantity) in lines {
            let key = CartKey {
                user_id: user,
                mini_app_type: MiniAppType::RetailStore,
                product_id: *product_id,
            };
            shop.add_quantity(&key, *quantity).await.unwrap();
        }
    }

    fn money(s: &str) -> Money {
        Money::new(s.parse().unwrap())
    }

    #[tokio::test]
    async fn test_empty_cart_creates_nothing() {
        let shop = MemoryShop::default();

        let err = CheckoutService::new(&shop, &shop)
            .checkout(UserId::generate(), MiniAppType::RetailStore)
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::EmptyCart));
        assert_eq!(shop.order_count(), 0);
    }

    #[tokio::test]
    async fn test_total_is_sum_of_captured_lines() {
        let shop = MemoryShop::default();
        let tea = shop.stock("4.20", 30);
        let cups = shop.stock("0.35", 100);
        let user = UserId::generate();
        fill(&shop, user, &[(tea, 3), (cups, 10)]).await;

        let order = CheckoutService::new(&shop, &shop)
            .checkout(user, MiniAppType::RetailStore)
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_amount, money("16.10"));
        let sum: Money = order.items.iter().map(|i| i.total_price).sum();
        assert_eq!(sum, order.total_amount);
        for item in &order.items {
            assert_eq!(item.unit_price.times(item.quantity).unwrap(), item.total_price);
        }
    }

    #[tokio::test]
    async fn test_checkout_clears_ordered_lines() {
        let shop = MemoryShop::default();
        let tea = shop.stock("4.20", 30);
        let user = UserId::generate();
        fill(&shop, user, &[(tea, 1)]).await;

        CheckoutService::new(&shop, &shop)
            .checkout(user, MiniAppType::RetailStore)
            .await
            .unwrap();

        assert_eq!(shop.line_count(), 0);
    }

    #[tokio::test]
    async fn test_line_raised_after_assembly_stays_in_cart() {
        let shop = MemoryShop::default();
        let tea = shop.stock("4.20", 30);
        let cups = shop.stock("0.35", 100);
        let user = UserId::generate();
        fill(&shop, user, &[(tea, 2), (cups, 5)]).await;

        let lines = shop.lines(user, MiniAppType::RetailStore).await.unwrap();
        let new_order = assemble_order(user, MiniAppType::RetailStore, &lines).unwrap();
        fill(&shop, user, &[(tea, 1)]).await;
        shop.place_order(&new_order).await.unwrap();

        let left = shop.lines(user, MiniAppType::RetailStore).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].product.id, tea);
        assert_eq!(left[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_captured_price_ignores_later_changes() {
        let shop = MemoryShop::default();
        let tea = shop.stock("4.20", 30);
        let user = UserId::generate();
        fill(&shop, user, &[(tea, 2)]).await;

        let order = CheckoutService::new(&shop, &shop)
            .checkout(user, MiniAppType::RetailStore)
            .await
            .unwrap();
        shop.edit_product(tea, |p| p.main_price = money("99.00"));

        let stored = shop.order(order.id).await.unwrap().unwrap();
        assert_eq!(stored.items[0].unit_price, money("4.20"));
        assert_eq!(stored.total_amount, money("8.40"));
    }

    #[tokio::test]
    async fn test_stale_stock_fails_whole_checkout() {
        let shop = MemoryShop::default();
        let tea = shop.stock("4.20", 30);
        let cups = shop.stock("0.35", 100);
        let user = UserId::generate();
        fill(&shop, user, &[(tea, 5), (cups, 10)]).await;
        // display stock drops to 3 after the add
        shop.edit_product(tea, |p| p.stock_left = 8);

        let err = CheckoutService::new(&shop, &shop)
            .checkout(user, MiniAppType::RetailStore)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::InsufficientStock { product_id, requested: 5, available: 3 }
                if product_id == tea
        ));
        assert_eq!(shop.order_count(), 0);
        assert_eq!(shop.line_count(), 2);
    }

    #[tokio::test]
    async fn test_delisted_product_fails_checkout() {
        let shop = MemoryShop::default();
        let tea = shop.stock("4.20", 30);
        let user = UserId::generate();
        fill(&shop, user, &[(tea, 1)]).await;
        shop.edit_product(tea, |p| p.is_active = false);

        let err = CheckoutService::new(&shop, &shop)
            .checkout(user, MiniAppType::RetailStore)
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::ProductUnavailable { product_id } if product_id == tea));
        assert_eq!(shop.order_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_cart() {
        let shop = MemoryShop::default();
        let tea = shop.stock("4.20", 30);
        let user = UserId::generate();
        fill(&shop, user, &[(tea, 1)]).await;
        shop.fail_place.store(true, Ordering::SeqCst);

        let err = CheckoutService::new(&shop, &shop)
            .checkout(user, MiniAppType::RetailStore)
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Repository(_)));
        assert_eq!(shop.order_count(), 0);
        assert_eq!(shop.line_count(), 1);
    }

    #[test]
    fn test_stock_is_checked_before_availability() {
        let now = chrono::Utc::now();
        let lines = [CartLine {
            id: madeinworld_core::CartLineId::generate(),
            user_id: UserId::generate(),
            mini_app_type: MiniAppType::RetailStore,
            quantity: 1,
            product: crate::models::Product {
                id: ProductId::generate(),
                sku: "SKU-OUT".to_owned(),
                title: "Retired mug".to_owned(),
                main_price: money("1.00"),
                stock_left: 0,
                minimum_order_quantity: 1,
                is_active: false,
            },
            created_at: now,
            updated_at: now,
        }];

        let err = assemble_order(UserId::generate(), MiniAppType::RetailStore, &lines).unwrap_err();

        assert!(matches!(err, CheckoutError::InsufficientStock { .. }));
    }
}
