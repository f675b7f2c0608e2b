//! Business logic services.
//!
//! # Services
//!
//! - `token` - Signed session token issue and verification
//! - `auth` - Password login, token validation against the store, logout
//! - `balance` - Locked read-modify-write of user balances
//! - `price` - Price catalog lookup with optional overwrite

pub mod auth;
pub mod balance;
pub mod price;
pub mod token;
