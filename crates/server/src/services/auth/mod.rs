//! Authentication service.
//!
//! Password login issues a session token and records it as the user's only
//! valid token. Validation verifies the token itself, then cross-checks the
//! store so that reissue and logout revoke earlier tokens.
//!
//! ```text
//! Unauthenticated -> Parsing -> Verifying -> StoreCheck -> Authenticated
//!                        \           \            \
//!                         +-----------+------------+--> Rejected(reason)
//! ```

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use tally_core::{Identity, UserId};

use crate::db::users::UserRepository;
use crate::models::{IssuedToken, StoredSession};
use crate::services::token::TokenCodec;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Authorization scheme prefix. Matched case-sensitively and optional.
const BEARER_PREFIX: &str = "Bearer ";

/// Authentication service.
///
/// Handles login, token validation against the store, and logout.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: &'a TokenCodec,
    token_ttl: Duration,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, tokens: &'a TokenCodec, token_ttl: Duration) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens,
            token_ttl,
        }
    }

    /// Login with username and password and issue a fresh token.
    ///
    /// The new token replaces whatever token the user held before.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username/password is wrong.
    /// Returns `AuthError::SigningUnavailable` if no signing secret is configured.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AuthError> {
        let login = self
            .users
            .find_login(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &login.password_hash)?;

        let (token, claims) = self
            .tokens
            .issue(login.id, now, self.token_ttl)
            .map_err(AuthError::SigningUnavailable)?;

        self.users
            .store_session(login.id, &token, claims.expires_at)
            .await?;

        tracing::info!(user_id = %login.id, expires_at = %claims.expires_at, "Issued session token");

        Ok(IssuedToken::bearer(token, claims.expires_at))
    }

    /// Validate a presented token and resolve the caller's identity.
    ///
    /// # Errors
    ///
    /// - `InvalidToken`, `TokenExpired`, `InvalidClaims` from the token itself
    /// - `UserNotFound` if the subject has no user row
    /// - `TokenMismatch` if the token is not the user's current token
    /// - `TokenExpired` if the stored session has expired
    /// - `Repository` if the lookup fails
    pub async fn authenticate(
        &self,
        presented: &str,
        now: DateTime<Utc>,
    ) -> Result<Identity, AuthError> {
        let claims = self.tokens.verify(presented, now)?;

        let stored = self
            .users
            .find_session(claims.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        check_session(claims.user_id, &stored, presented, now)
    }

    /// Revoke the user's current token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the update fails.
    pub async fn logout(&self, user_id: UserId) -> Result<(), AuthError> {
        self.users.clear_session(user_id).await?;
        tracing::info!(user_id = %user_id, "Session revoked");
        Ok(())
    }
}

/// Extract the token from an `Authorization` header value.
///
/// The `Bearer ` prefix is optional and case-sensitive.
///
/// # Errors
///
/// Returns `AuthError::MissingCredential` if nothing remains after the prefix.
pub fn bearer_token(header_value: &str) -> Result<&str, AuthError> {
    let token = header_value
        .strip_prefix(BEARER_PREFIX)
        .unwrap_or(header_value)
        .trim();

    if token.is_empty() {
        return Err(AuthError::MissingCredential);
    }

    Ok(token)
}

/// Cross-check a verified token against the user's stored session.
///
/// # Errors
///
/// Returns `AuthError::TokenMismatch` if the stored token differs (including
/// when none is stored), or `AuthError::TokenExpired` if the stored expiry has
/// passed.
pub fn check_session(
    user_id: UserId,
    stored: &StoredSession,
    presented: &str,
    now: DateTime<Utc>,
) -> Result<Identity, AuthError> {
    let matches = stored
        .token
        .as_deref()
        .is_some_and(|current| constant_time_compare(current, presented));
    if !matches {
        return Err(AuthError::TokenMismatch);
    }

    match stored.expires_at {
        Some(expires_at) if now < expires_at => Ok(Identity::new(user_id, expires_at)),
        _ => Err(AuthError::TokenExpired),
    }
}

/// Validate password meets requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}
