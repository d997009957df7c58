//! Storefront contexts ("mini-app types").
//!
//! Carts, orders, and categories are partitioned by the storefront they were
//! created in. The same product can sit in a user's retail cart and their
//! group-buying cart at the same time as two independent lines.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Returned when a path segment or column value names no known storefront.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mini-app type: {0}")]
pub struct UnknownMiniAppType(pub String);

/// A storefront context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "mini_app_type", rename_all = "PascalCase")
)]
pub enum MiniAppType {
    /// Staffed retail store.
    RetailStore,
    /// Unattended store or vending warehouse.
    UnmannedStore,
    /// Event and exhibition sales.
    ExhibitionSales,
    /// Group-buying campaigns.
    GroupBuying,
}

impl MiniAppType {
    /// Every storefront context, in display order.
    pub const ALL: [Self; 4] = [
        Self::RetailStore,
        Self::UnmannedStore,
        Self::ExhibitionSales,
        Self::GroupBuying,
    ];

    /// Wire name, identical to the serde representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RetailStore => "RetailStore",
            Self::UnmannedStore => "UnmannedStore",
            Self::ExhibitionSales => "ExhibitionSales",
            Self::GroupBuying => "GroupBuying",
        }
    }

    /// Location-based storefronts need a physical store on cart additions.
    #[must_use]
    pub const fn requires_store(self) -> bool {
        matches!(self, Self::UnmannedStore | Self::ExhibitionSales)
    }
}

impl fmt::Display for MiniAppType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MiniAppType {
    type Err = UnknownMiniAppType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownMiniAppType(s.to_owned()))
    }
}
