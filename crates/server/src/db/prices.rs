//! Price catalog repository.

use sqlx::PgPool;

use tally_core::{ItemName, Money};

use super::RepositoryError;

/// Repository for the price catalog.
pub struct PriceRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PriceRepository<'a> {
    /// Create a new price repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the current price of an item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, item: &ItemName) -> Result<Option<Money>, RepositoryError> {
        let price = sqlx::query_scalar::<_, Money>(
            r"
            SELECT price
            FROM item_prices
            WHERE item_name = $1
            ",
        )
        .bind(item.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(price)
    }

    /// Overwrite the price of an existing item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(&self, item: &ItemName, price: Money) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE item_prices
            SET price = $1
            WHERE item_name = $2
            ",
        )
        .bind(price)
        .bind(item.as_str())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Insert an item or replace its price.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(&self, item: &ItemName, price: Money) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO item_prices (item_name, price)
            VALUES ($1, $2)
            ON CONFLICT (item_name) DO UPDATE SET price = EXCLUDED.price
            ",
        )
        .bind(item.as_str())
        .bind(price)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
