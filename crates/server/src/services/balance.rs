//! Balance mutation.
//!
//! Every change to a balance row happens inside one transaction. Deltas read
//! the current value with `SELECT ... FOR UPDATE`, so concurrent adjustments
//! for the same user commit one after another and none is lost.

use sqlx::PgConnection;
use thiserror::Error;

use tally_core::{Money, MoneyError, UserId};

use crate::db::{BalanceRepository, RepositoryError, Store};

/// Errors that can occur while mutating a balance.
#[derive(Debug, Error)]
pub enum BalanceError {
    /// Neither `balance` nor `amount` was supplied.
    #[error("either balance or amount is required")]
    MissingOperand,

    /// A supplied value is not a valid amount.
    #[error("invalid {field}: {source}")]
    InvalidInput {
        field: &'static str,
        #[source]
        source: MoneyError,
    },

    /// The new balance does not fit the balance column.
    #[error("balance overflow")]
    Overflow,

    /// The user has no balance row.
    #[error("user not found")]
    UserNotFound,

    /// The write matched no row after the lock was taken.
    #[error("balance update had no effect")]
    NoEffect,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// A requested change to a balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceMutation {
    /// Replace the balance unconditionally.
    SetAbsolute(Money),
    /// Add a signed delta to the current balance.
    AdjustBy(Money),
}

impl BalanceMutation {
    /// Build a mutation from the raw request fields.
    ///
    /// An absolute `balance` takes precedence: when it is present `amount` is
    /// ignored entirely, even if it would not parse. Blank values count as
    /// absent.
    ///
    /// # Errors
    ///
    /// Returns `BalanceError::MissingOperand` if neither field is present and
    /// `BalanceError::InvalidInput` if the chosen field is not a number.
    pub fn from_fields(balance: Option<&str>, amount: Option<&str>) -> Result<Self, BalanceError> {
        if let Some(raw) = present(balance) {
            return Money::parse(raw)
                .map(Self::SetAbsolute)
                .map_err(|source| BalanceError::InvalidInput {
                    field: "balance",
                    source,
                });
        }

        if let Some(raw) = present(amount) {
            return Money::parse(raw)
                .map(Self::AdjustBy)
                .map_err(|source| BalanceError::InvalidInput {
                    field: "amount",
                    source,
                });
        }

        Err(BalanceError::MissingOperand)
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Balance mutation service.
pub struct BalanceService<'a> {
    store: &'a Store,
}

impl<'a> BalanceService<'a> {
    /// Create a new balance service.
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Apply `mutation` to the balance of `user_id` and return the new value.
    ///
    /// The whole transaction runs under the store deadline. Failures before
    /// commit roll back, leaving the balance unchanged.
    ///
    /// # Errors
    ///
    /// - `UserNotFound` if the user has no balance row
    /// - `NoEffect` if the locked row could not be written
    /// - `Overflow` if the new balance is out of the column's range
    /// - `Repository` for store failures, including the deadline
    pub async fn mutate(
        &self,
        user_id: UserId,
        mutation: BalanceMutation,
    ) -> Result<Money, BalanceError> {
        let new_balance = self
            .store
            .within_deadline(self.run_transaction(user_id, mutation))
            .await?;

        tracing::info!(
            user_id = %user_id,
            mutation = ?mutation,
            new_balance = %new_balance,
            "Balance updated"
        );

        Ok(new_balance)
    }

    async fn run_transaction(
        &self,
        user_id: UserId,
        mutation: BalanceMutation,
    ) -> Result<Money, BalanceError> {
        let mut tx = self
            .store
            .pool()
            .begin()
            .await
            .map_err(RepositoryError::from)?;

        match apply(&mut tx, user_id, mutation).await {
            Ok(new_balance) => {
                tx.commit().await.map_err(RepositoryError::from)?;
                Ok(new_balance)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(
                        user_id = %user_id,
                        error = %rollback_err,
                        "Failed to roll back balance transaction"
                    );
                }
                Err(e)
            }
        }
    }
}

/// Perform the mutation on a connection inside an open transaction.
async fn apply(
    conn: &mut PgConnection,
    user_id: UserId,
    mutation: BalanceMutation,
) -> Result<Money, BalanceError> {
    let mut balances = BalanceRepository::new(conn);

    match mutation {
        BalanceMutation::SetAbsolute(value) => {
            if balances.write(user_id, value).await? == 0 {
                return Err(BalanceError::UserNotFound);
            }
            Ok(value)
        }
        BalanceMutation::AdjustBy(delta) => {
            let current = balances
                .lock(user_id)
                .await?
                .ok_or(BalanceError::UserNotFound)?;

            let new_balance = current.checked_add(delta).ok_or(BalanceError::Overflow)?;

            if balances.write(user_id, new_balance).await? == 0 {
                return Err(BalanceError::NoEffect);
            }
            Ok(new_balance)
        }
    }
}
