//! Domain models for the server.
//!
//! These types represent validated domain objects separate from database row types.

pub mod session;
pub mod user;

pub use session::{IssuedToken, StoredSession};
pub use user::UserLogin;
