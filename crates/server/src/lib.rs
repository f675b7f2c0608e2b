//! Tally server library.
//!
//! Bearer-token gated balance and price service. Exposed as a library so the
//! CLI and the integration tests share the store, repositories, and services
//! with the binary.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
