//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::balance::BalanceError;
use crate::services::price::PriceError;

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Store operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication failed or could not be performed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Balance mutation failed.
    #[error("Balance error: {0}")]
    Balance(#[from] BalanceError),

    /// Price resolution failed.
    #[error("Price error: {0}")]
    Price(#[from] PriceError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) => repository_status(err),
            Self::Auth(err) => match err {
                AuthError::Repository(err) => repository_status(err),
                AuthError::PasswordHash | AuthError::SigningUnavailable(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                AuthError::WeakPassword(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::UNAUTHORIZED,
            },
            Self::Balance(err) => match err {
                BalanceError::MissingOperand
                | BalanceError::InvalidInput { .. }
                | BalanceError::Overflow => StatusCode::BAD_REQUEST,
                BalanceError::UserNotFound => StatusCode::NOT_FOUND,
                BalanceError::NoEffect => StatusCode::CONFLICT,
                BalanceError::Repository(err) => repository_status(err),
            },
            Self::Price(err) => match err {
                PriceError::InvalidItem(_) | PriceError::InvalidPrice(_) => {
                    StatusCode::BAD_REQUEST
                }
                PriceError::ItemNotFound(_) => StatusCode::NOT_FOUND,
                PriceError::Repository(err) => repository_status(err),
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Client-facing message. Server-side details are never exposed.
    fn public_message(&self, status: StatusCode) -> String {
        if status == StatusCode::SERVICE_UNAVAILABLE {
            return "Service temporarily unavailable".to_string();
        }
        if status.is_server_error() {
            return "Internal server error".to_string();
        }

        match self {
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid credentials".to_string(),
                AuthError::MissingCredential => "Missing authorization token".to_string(),
                AuthError::TokenExpired => "Token expired".to_string(),
                AuthError::TokenMismatch => "Token has been superseded or revoked".to_string(),
                AuthError::WeakPassword(msg) => msg.clone(),
                _ => "Invalid token".to_string(),
            },
            Self::Balance(err) => err.to_string(),
            Self::Price(err) => err.to_string(),
            _ => self.to_string(),
        }
    }
}

const fn repository_status(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let message = self.public_message(status);
        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use tally_core::{ItemName, MoneyError};

    use super::*;
    use crate::services::token::TokenError;

    fn get_status(err: impl Into<AppError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_auth_errors_are_unauthorized() {
        for err in [
            AuthError::MissingCredential,
            AuthError::InvalidToken(TokenError::BadSignature),
            AuthError::InvalidToken(TokenError::MissingSecret),
            AuthError::TokenExpired,
            AuthError::TokenMismatch,
            AuthError::UserNotFound,
            AuthError::InvalidClaims("user_id"),
            AuthError::InvalidCredentials,
        ] {
            assert_eq!(get_status(err), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_login_without_secret_is_server_error() {
        assert_eq!(
            get_status(AuthError::SigningUnavailable(TokenError::MissingSecret)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_balance_error_status_codes() {
        assert_eq!(
            get_status(BalanceError::MissingOperand),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(BalanceError::InvalidInput {
                field: "amount",
                source: MoneyError::Invalid("x".to_string()),
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(get_status(BalanceError::UserNotFound), StatusCode::NOT_FOUND);
        assert_eq!(get_status(BalanceError::NoEffect), StatusCode::CONFLICT);
        assert_eq!(
            get_status(BalanceError::Repository(RepositoryError::NotFound)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_price_error_status_codes() {
        assert_eq!(
            get_status(PriceError::ItemNotFound(ItemName::parse("widget").unwrap())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(PriceError::InvalidPrice(MoneyError::Empty)),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_timeout_is_service_unavailable() {
        assert_eq!(
            get_status(RepositoryError::Timeout(Duration::from_secs(10))),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            get_status(BalanceError::Repository(RepositoryError::Timeout(
                Duration::from_secs(10)
            ))),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_server_errors_hide_details() {
        let err = AppError::Database(RepositoryError::Conflict("secret row".to_string()));
        let message = err.public_message(err.status());
        assert_eq!(message, "Internal server error");
    }
}
