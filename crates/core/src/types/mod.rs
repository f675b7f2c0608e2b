//! Core types for Tally.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod identity;
pub mod item;
pub mod money;

pub use id::*;
pub use identity::Identity;
pub use item::{ItemName, ItemNameError};
pub use money::{Money, MoneyError};
