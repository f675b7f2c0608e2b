//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::token::TokenError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No credential was presented.
    #[error("missing credential")]
    MissingCredential,

    /// The token is malformed, unsigned, signed with another key, or no
    /// signing secret is configured.
    #[error("invalid token: {0}")]
    InvalidToken(TokenError),

    /// The token (or the stored session behind it) has expired.
    #[error("token expired")]
    TokenExpired,

    /// The presented token is not the user's current token.
    #[error("token does not match the active session")]
    TokenMismatch,

    /// The token's subject has no user row.
    #[error("user not found")]
    UserNotFound,

    /// A required claim is missing or not integer-representable.
    #[error("invalid token claims: {0}")]
    InvalidClaims(&'static str),

    /// Unknown username or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Tokens cannot be issued because no signing secret is configured.
    #[error("token signing unavailable: {0}")]
    SigningUnavailable(TokenError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => Self::TokenExpired,
            TokenError::InvalidClaims(claim) => Self::InvalidClaims(claim),
            other => Self::InvalidToken(other),
        }
    }
}

impl AuthError {
    /// Whether this error means "the caller is not authenticated" as opposed
    /// to a server-side failure.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        !matches!(
            self,
            Self::Repository(_) | Self::PasswordHash | Self::SigningUnavailable(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_error_classification() {
        assert!(matches!(
            AuthError::from(TokenError::Expired),
            AuthError::TokenExpired
        ));
        assert!(matches!(
            AuthError::from(TokenError::InvalidClaims("user_id")),
            AuthError::InvalidClaims("user_id")
        ));
        assert!(matches!(
            AuthError::from(TokenError::BadSignature),
            AuthError::InvalidToken(TokenError::BadSignature)
        ));
        assert!(matches!(
            AuthError::from(TokenError::MissingSecret),
            AuthError::InvalidToken(TokenError::MissingSecret)
        ));
    }

    #[test]
    fn test_is_rejection() {
        assert!(AuthError::TokenMismatch.is_rejection());
        assert!(AuthError::MissingCredential.is_rejection());
        assert!(!AuthError::Repository(RepositoryError::NotFound).is_rejection());
        assert!(!AuthError::SigningUnavailable(TokenError::MissingSecret).is_rejection());
    }
}
