//! User domain types.

use tally_core::UserId;

/// Credentials needed to verify a login attempt.
///
/// `Debug` is implemented manually so the hash never reaches logs.
#[derive(Clone)]
pub struct UserLogin {
    /// Unique user ID.
    pub id: UserId,
    /// Argon2 PHC-format password hash.
    pub password_hash: String,
}

impl std::fmt::Debug for UserLogin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserLogin")
            .field("id", &self.id)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}
