//! Session-related types.
//!
//! Each user has at most one active session token, stored on the user row
//! together with its expiry. Issuing a new token overwrites the old one.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// The server-side validity record for a user's session.
#[derive(Clone, PartialEq, Eq)]
pub struct StoredSession {
    /// The most recently issued token, if any.
    pub token: Option<String>,
    /// When the stored token stops being valid.
    pub expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for StoredSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredSession")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// A freshly issued token returned by login.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    /// The signed token.
    pub token: String,
    /// Always `"Bearer"`.
    pub token_type: &'static str,
    /// When the token expires.
    pub expires_at: DateTime<Utc>,
}

impl IssuedToken {
    /// Wrap a signed bearer token.
    #[must_use]
    pub const fn bearer(token: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            token,
            token_type: "Bearer",
            expires_at,
        }
    }
}
