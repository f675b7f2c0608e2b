//! User repository for database operations.
//!
//! Covers login lookups and the per-user session record (current token and
//! expiry) that token validation cross-checks against.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgExecutor, PgPool};

use tally_core::UserId;

use super::{RepositoryError, conflict_on_unique};
use crate::models::{StoredSession, UserLogin};

#[derive(sqlx::FromRow)]
struct LoginRow {
    id: UserId,
    password_hash: String,
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    token: Option<String>,
    token_expires_at: Option<DateTime<Utc>>,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the id and password hash for a username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_login(&self, username: &str) -> Result<Option<UserLogin>, RepositoryError> {
        let row = sqlx::query_as::<_, LoginRow>(
            r"
            SELECT id, password_hash
            FROM users
            WHERE username = $1
            ",
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| UserLogin {
            id: r.id,
            password_hash: r.password_hash,
        }))
    }

    /// Get the stored session record for a user.
    ///
    /// Returns `None` if no user row matches.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_session(
        &self,
        user_id: UserId,
    ) -> Result<Option<StoredSession>, RepositoryError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r"
            SELECT token, token_expires_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| StoredSession {
            token: r.token,
            expires_at: r.token_expires_at,
        }))
    }

    /// Replace the user's active token, invalidating any earlier one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn store_session(
        &self,
        user_id: UserId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET token = $1, token_expires_at = $2, updated_at = NOW()
            WHERE id = $3
            ",
        )
        .bind(token)
        .bind(expires_at)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Clear the user's active token (logout).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn clear_session(&self, user_id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET token = NULL, token_expires_at = NULL, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(user_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Create a user with a pre-hashed password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<UserId, RepositoryError> {
        insert_user(self.pool, username, password_hash).await
    }

    /// Create a user on an open connection, usually inside a transaction
    /// that also provisions the balance row.
    ///
    /// # Errors
    ///
    /// Same as [`UserRepository::create`].
    pub async fn create_in(
        conn: &mut PgConnection,
        username: &str,
        password_hash: &str,
    ) -> Result<UserId, RepositoryError> {
        insert_user(conn, username, password_hash).await
    }
}

async fn insert_user<'e, E>(
    executor: E,
    username: &str,
    password_hash: &str,
) -> Result<UserId, RepositoryError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, UserId>(
        r"
        INSERT INTO users (username, password_hash)
        VALUES ($1, $2)
        RETURNING id
        ",
    )
    .bind(username)
    .bind(password_hash)
    .fetch_one(executor)
    .await
    .map_err(|e| conflict_on_unique(e, "username"))
}
