//! Credential store access for `PostgreSQL`.
//!
//! ## Tables
//!
//! - `users` - Login credentials plus the single active session token and its expiry
//! - `user_balances` - One balance row per user (provisioned externally)
//! - `item_prices` - Price catalog keyed by item name
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p tally-cli -- migrate
//! ```

pub mod balances;
pub mod prices;
pub mod users;

use std::future::Future;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use balances::BalanceRepository;
pub use prices::PriceRepository;
pub use users::UserRepository;

use crate::config::DatabaseConfig;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique username).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The operation did not finish within its deadline.
    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Handle to the credential store.
///
/// Constructed once at process start, health-checked, shared through
/// `AppState`, and closed on shutdown.
#[derive(Debug, Clone)]
pub struct Store {
    pool: PgPool,
    deadline: Duration,
}

impl Store {
    /// Open a connection pool and verify the store answers within the
    /// configured connect timeout.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the pool cannot be created and
    /// `RepositoryError::Timeout` if the ping does not complete in time.
    pub async fn connect(
        config: &DatabaseConfig,
        deadline: Duration,
    ) -> Result<Self, RepositoryError> {
        let pool = create_pool(&config.url, config.connect_timeout).await?;
        let store = Self::from_pool(pool, deadline);
        with_deadline(config.connect_timeout, store.ping()).await?;
        Ok(store)
    }

    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool, deadline: Duration) -> Self {
        Self { pool, deadline }
    }

    /// Round-trip a trivial query.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the store is unreachable.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Close all pooled connections, waiting for checked-out ones to return.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run `operation` under this store's per-operation deadline.
    ///
    /// # Errors
    ///
    /// Propagates the operation's error, or `RepositoryError::Timeout`.
    pub async fn within_deadline<T, E, F>(&self, operation: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: From<RepositoryError>,
    {
        with_deadline(self.deadline, operation).await
    }
}

/// Run `operation`, failing with `RepositoryError::Timeout` once `limit` elapses.
///
/// The operation future is dropped on timeout. Any open transaction inside it
/// is rolled back by sqlx when the `Transaction` is dropped.
///
/// # Errors
///
/// Propagates the operation's error, or `RepositoryError::Timeout`.
pub async fn with_deadline<T, E, F>(limit: Duration, operation: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<RepositoryError>,
{
    tokio::time::timeout(limit, operation)
        .await
        .unwrap_or_else(|_| Err(RepositoryError::Timeout(limit).into()))
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
/// * `acquire_timeout` - Bound on waiting for a pooled connection
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(
    database_url: &secrecy::SecretString,
    acquire_timeout: Duration,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(acquire_timeout)
        .connect(database_url.expose_secret())
        .await
}

/// Map a unique-violation into `RepositoryError::Conflict`.
pub(crate) fn conflict_on_unique(err: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_deadline_times_out() {
        let result: Result<(), RepositoryError> = with_deadline(
            Duration::from_millis(10),
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            },
        )
        .await;

        assert!(matches!(result, Err(RepositoryError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_with_deadline_passes_through() {
        let result: Result<u8, RepositoryError> =
            with_deadline(Duration::from_secs(1), async { Ok(7) }).await;
        assert_eq!(result.ok(), Some(7));

        let result: Result<u8, RepositoryError> =
            with_deadline(Duration::from_secs(1), async { Err(RepositoryError::NotFound) }).await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }
}
