//! Customer-facing stock arithmetic.
//!
//! Raw inventory counts are never shown or sold down to zero. A fixed safety
//! buffer is held back, and every availability decision (cart additions and
//! checkout re-validation) uses the buffered *display stock*.

use serde::Serialize;

/// Units held back from customers on every product.
pub const DISPLAY_STOCK_BUFFER: i32 = 5;

/// Display stock for a raw inventory count: `raw - 5`, floored at zero.
///
/// ```
/// use madeinworld_core::display_stock;
///
/// assert_eq!(display_stock(100), 95);
/// assert_eq!(display_stock(3), 0);
/// ```
#[must_use]
pub const fn display_stock(raw_stock: i32) -> i32 {
    if raw_stock > DISPLAY_STOCK_BUFFER {
        raw_stock - DISPLAY_STOCK_BUFFER
    } else {
        0
    }
}

/// Details of a rejected quantity, shaped for client display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StockShortfall {
    /// Quantity the client asked for in this request.
    pub requested: i32,
    /// Display stock at the time of the check.
    pub available: i32,
    /// Quantity already in the cart line (0 when absent).
    pub current: i32,
}

/// Check that adding `requested` units on top of `current` fits the display
/// stock derived from `raw_stock`.
///
/// # Errors
///
/// Returns the shortfall when `current + requested > display_stock(raw_stock)`.
pub fn check_cart_addition(
    current: i32,
    requested: i32,
    raw_stock: i32,
) -> Result<(), StockShortfall> {
    let available = display_stock(raw_stock);
    let total = i64::from(current) + i64::from(requested);
    if total > i64::from(available) {
        return Err(StockShortfall {
            requested,
            available,
            current,
        });
    }
    Ok(())
}
