//! HTTP middleware.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction)
//! 2. `TraceLayer` (request span: method, uri, status, latency)
//! 3. Request ID (correlation id on span, Sentry scope, response)
//!
//! Authorization is not a layer: handlers opt in by taking [`RequireAuth`].

pub mod auth;
pub mod request_id;

pub use auth::RequireAuth;
pub use request_id::{RequestId, request_id_middleware};
