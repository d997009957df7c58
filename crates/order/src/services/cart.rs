//! Cart & stock ledger.
//!
//! Additions are soft-checked against display stock; the check and the write
//! are separate statements, so concurrent additions near the boundary can
//! both pass. Checkout re-validates every line and is the hard check.

use madeinworld_core::{MiniAppType, UserId, check_cart_addition};

use super::error::CartError;
use super::store::CartStore;
use crate::models::{CartKey, CartView};

/// Cart operations for one request.
pub struct CartLedger<'a, S> {
    store: &'a S,
}

impl<'a, S: CartStore> CartLedger<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Add `quantity` units to the line for `key`.
    ///
    /// `store_id` is required for location-based storefronts and otherwise
    /// ignored.
    ///
    /// # Errors
    ///
    /// - `InvalidQuantity` when `quantity < 1`
    /// - `StoreRequired` for a location-based storefront without `store_id`
    /// - `ProductNotFound` for an unknown product
    /// - `InsufficientStock` when the line would exceed display stock
    /// - `ProductUnavailable` for a delisted product
    #[tracing::instrument(skip(self), fields(user_id = %key.user_id, product_id = %key.product_id))]
    pub async fn add(
        &self,
        key: &CartKey,
        quantity: i32,
        store_id: Option<i64>,
    ) -> Result<(), CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity {
                min: 1,
                got: quantity,
            });
        }
        if key.mini_app_type.requires_store() && store_id.is_none() {
            return Err(CartError::StoreRequired(key.mini_app_type));
        }

        let product = self
            .store
            .product(key.product_id)
            .await?
            .ok_or(CartError::ProductNotFound)?;
        let current = self.store.line_quantity(key).await?.unwrap_or(0);

        if let Err(shortfall) = check_cart_addition(current, quantity, product.stock_left) {
            tracing::info!(
                requested = shortfall.requested,
                available = shortfall.available,
                current = shortfall.current,
                "Cart addition exceeds display stock"
            );
            return Err(CartError::InsufficientStock(shortfall));
        }
        if !product.is_active {
            return Err(CartError::ProductUnavailable);
        }

        self.store.add_quantity(key, quantity).await?;
        tracing::debug!(quantity, "Added to cart");
        Ok(())
    }

    /// Overwrite the line's quantity; 0 removes the line.
    ///
    /// Stock is not re-checked here; checkout catches any excess.
    ///
    /// # Errors
    ///
    /// `InvalidQuantity` for a negative quantity, `LineNotFound` if the line
    /// does not exist.
    pub async fn update(&self, key: &CartKey, quantity: i32) -> Result<(), CartError> {
        if quantity < 0 {
            return Err(CartError::InvalidQuantity {
                min: 0,
                got: quantity,
            });
        }
        if quantity == 0 {
            return self.remove(key).await;
        }

        if !self.store.set_quantity(key, quantity).await? {
            return Err(CartError::LineNotFound);
        }
        Ok(())
    }

    /// Delete the line for `key`.
    ///
    /// # Errors
    ///
    /// `LineNotFound` if the line does not exist.
    pub async fn remove(&self, key: &CartKey) -> Result<(), CartError> {
        if !self.store.remove_line(key).await? {
            return Err(CartError::LineNotFound);
        }
        Ok(())
    }

    /// The user's cart in one storefront at current prices.
    ///
    /// # Errors
    ///
    /// `Repository` on storage failure, `Overflow` if a total overflows.
    pub async fn view(
        &self,
        user_id: UserId,
        mini_app_type: MiniAppType,
    ) -> Result<CartView, CartError> {
        let lines = self.store.lines(user_id, mini_app_type).await?;
        CartView::price(mini_app_type, &lines).ok_or(CartError::Overflow)
    }
}
