//! Tally Core - Shared types library.
//!
//! This crate provides common types used across all Tally components:
//! - `server` - Token-gated balance and price HTTP service
//! - `cli` - Command-line tools for migrations and provisioning
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, money amounts, item names and identities

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
