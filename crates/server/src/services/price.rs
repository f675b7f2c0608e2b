//! Price catalog resolution.

use serde::Serialize;
use thiserror::Error;

use tally_core::{ItemName, ItemNameError, Money, MoneyError};

use crate::db::{PriceRepository, RepositoryError, Store};

/// Errors that can occur while resolving a price.
#[derive(Debug, Error)]
pub enum PriceError {
    /// The item name is missing or invalid.
    #[error(transparent)]
    InvalidItem(#[from] ItemNameError),

    /// The supplied price is not a number or is out of range.
    #[error("invalid price: {0}")]
    InvalidPrice(#[from] MoneyError),

    /// No catalog entry for the item.
    #[error("item not found: {0}")]
    ItemNotFound(ItemName),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// A parsed price query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceQuery {
    /// Catalog key.
    pub item: ItemName,
    /// Replacement price, if supplied.
    pub new_price: Option<Money>,
    /// Whether `new_price` should be written.
    pub overwrite: bool,
}

impl PriceQuery {
    /// Build a query from raw request fields.
    ///
    /// A supplied price must parse even when `overwrite` is false.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::InvalidItem` for a blank or oversized item name and
    /// `PriceError::InvalidPrice` for a malformed price.
    pub fn from_fields(
        item_name: Option<&str>,
        price: Option<&str>,
        overwrite: bool,
    ) -> Result<Self, PriceError> {
        let item = ItemName::parse(item_name.unwrap_or_default())?;
        let new_price = price
            .filter(|p| !p.trim().is_empty())
            .map(Money::parse)
            .transpose()?;

        Ok(Self {
            item,
            new_price,
            overwrite,
        })
    }

    /// The price to write, if this query overwrites.
    #[must_use]
    pub const fn replacement(&self) -> Option<Money> {
        if self.overwrite { self.new_price } else { None }
    }
}

/// An item and its effective price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricedItem {
    pub item_name: ItemName,
    pub price: Money,
}

/// Price resolution service.
pub struct PriceService<'a> {
    store: &'a Store,
}

impl<'a> PriceService<'a> {
    /// Create a new price service.
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Look up an item's price, writing the replacement first if requested.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::ItemNotFound` if the item is not in the catalog.
    /// Returns `PriceError::Repository` for store failures, including the deadline.
    pub async fn resolve(&self, query: PriceQuery) -> Result<PricedItem, PriceError> {
        self.store.within_deadline(self.lookup(query)).await
    }

    async fn lookup(&self, query: PriceQuery) -> Result<PricedItem, PriceError> {
        let prices = PriceRepository::new(self.store.pool());

        let Some(current) = prices.get(&query.item).await? else {
            return Err(PriceError::ItemNotFound(query.item));
        };

        let Some(replacement) = query.replacement() else {
            return Ok(PricedItem {
                item_name: query.item,
                price: current,
            });
        };

        match prices.update(&query.item, replacement).await {
            Ok(()) => {}
            Err(RepositoryError::NotFound) => return Err(PriceError::ItemNotFound(query.item)),
            Err(e) => return Err(e.into()),
        }

        tracing::info!(
            item_name = %query.item,
            old_price = %current,
            new_price = %replacement,
            "Price overwritten"
        );

        Ok(PricedItem {
            item_name: query.item,
            price: replacement,
        })
    }
}
