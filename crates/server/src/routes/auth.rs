//! Login and logout handlers.

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use serde::Deserialize;

use crate::error::{AppError, Result, clear_sentry_user};
use crate::middleware::RequireAuth;
use crate::models::IssuedToken;
use crate::routes::payload::{self, Payload};
use crate::state::AppState;

/// Login request fields.
#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default, deserialize_with = "payload::text")]
    username: Option<String>,
    #[serde(default, deserialize_with = "payload::text")]
    password: Option<String>,
}

/// Exchange a username and password for a session token.
///
/// Any token the user held before stops working.
pub async fn login(
    State(state): State<AppState>,
    Payload(form): Payload<LoginForm>,
) -> Result<Json<IssuedToken>> {
    let username = form
        .username
        .as_deref()
        .map(str::trim)
        .ok_or_else(|| AppError::BadRequest("username is required".to_string()))?;
    let password = form
        .password
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("password is required".to_string()))?;

    let auth = state.auth();
    let issued = state
        .store()
        .within_deadline(auth.login(username, password, Utc::now()))
        .await
        .inspect_err(|e| {
            if e.is_rejection() {
                tracing::warn!(username = %username, reason = %e, "Login rejected");
            }
        })?;

    Ok(Json(issued))
}

/// Revoke the caller's token.
pub async fn logout(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
) -> Result<StatusCode> {
    let auth = state.auth();
    state
        .store()
        .within_deadline(auth.logout(identity.id))
        .await?;

    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}
