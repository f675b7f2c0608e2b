//! Authenticated caller identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

/// The caller a request was authenticated as.
///
/// Produced by successful token validation and handed explicitly to the
/// protected operation. Lives for exactly one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Subject of the validated token.
    pub id: UserId,
    /// When the session backing this identity stops being valid.
    pub valid_until: DateTime<Utc>,
}

impl Identity {
    /// Create a new identity.
    #[must_use]
    pub const fn new(id: UserId, valid_until: DateTime<Utc>) -> Self {
        Self { id, valid_until }
    }

    /// Whether the session is still valid at `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.valid_until
    }
}
