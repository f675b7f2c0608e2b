//! Authorization gate.
//!
//! `RequireAuth` is an extractor: a handler that takes it never runs unless
//! the request carries a token that is valid and current for its user. The
//! resolved [`Identity`] is handed to the handler as a typed argument.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::Utc;

use tally_core::Identity;

use crate::error::{AppError, set_sentry_user};
use crate::services::auth::{AuthError, bearer_token};
use crate::services::token::TokenError;
use crate::state::AppState;

/// Extractor that requires a valid session token.
///
/// Rejects with 401 before the handler runs when the credential is missing,
/// invalid, expired, or superseded.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(identity): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, user {}!", identity.id)
/// }
/// ```
pub struct RequireAuth(pub Identity);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match authenticate(parts, state).await {
            Ok(identity) => {
                tracing::Span::current().record("user_id", identity.id.as_i32());
                set_sentry_user(&identity.id);
                Ok(Self(identity))
            }
            Err(err) => {
                if err.is_rejection() {
                    tracing::warn!(
                        reason = %err,
                        path = %parts.uri.path(),
                        "Rejected unauthenticated request"
                    );
                }
                Err(err.into())
            }
        }
    }
}

async fn authenticate(parts: &Parts, state: &AppState) -> Result<Identity, AuthError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingCredential)?
        .to_str()
        .map_err(|_| {
            AuthError::InvalidToken(TokenError::Malformed("non-ASCII authorization header"))
        })?;

    let token = bearer_token(header)?;

    let auth = state.auth();
    state
        .store()
        .within_deadline(auth.authenticate(token, Utc::now()))
        .await
}
