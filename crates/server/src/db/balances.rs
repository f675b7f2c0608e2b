//! Balance repository.
//!
//! Operates on a borrowed connection so the caller decides the transaction
//! boundary. The row lock taken by [`BalanceRepository::lock`] is held until
//! that transaction commits or rolls back.

use sqlx::PgConnection;

use tally_core::{Money, UserId};

use super::{RepositoryError, conflict_on_unique};

/// Repository for balance rows.
pub struct BalanceRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> BalanceRepository<'c> {
    /// Create a repository over a connection (usually `&mut *tx`).
    #[must_use]
    pub const fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// Read a user's balance and take an exclusive lock on the row.
    ///
    /// Concurrent lockers of the same row block until the current transaction
    /// ends, then observe its committed value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lock(&mut self, user_id: UserId) -> Result<Option<Money>, RepositoryError> {
        let balance = sqlx::query_scalar::<_, Money>(
            r"
            SELECT balance
            FROM user_balances
            WHERE user_id = $1
            FOR UPDATE
            ",
        )
        .bind(user_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(balance)
    }

    /// Read a user's balance without locking.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&mut self, user_id: UserId) -> Result<Option<Money>, RepositoryError> {
        let balance = sqlx::query_scalar::<_, Money>(
            r"
            SELECT balance
            FROM user_balances
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(balance)
    }

    /// Overwrite a user's balance.
    ///
    /// Returns the number of rows the write matched (0 or 1).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn write(&mut self, user_id: UserId, balance: Money) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE user_balances
            SET balance = $1
            WHERE user_id = $2
            ",
        )
        .bind(balance)
        .bind(user_id)
        .execute(&mut *self.conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// Create the balance row for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already has a balance row.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn provision(&mut self, user_id: UserId, opening: Money) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO user_balances (user_id, balance)
            VALUES ($1, $2)
            ",
        )
        .bind(user_id)
        .bind(opening)
        .execute(&mut *self.conn)
        .await
        .map_err(|e| conflict_on_unique(e, "balance"))?;

        Ok(())
    }
}
