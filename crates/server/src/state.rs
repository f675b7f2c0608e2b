//! Application state shared across handlers.

use std::sync::Arc;

use chrono::TimeDelta;

use crate::config::ServerConfig;
use crate::db::Store;
use crate::services::auth::AuthService;
use crate::services::balance::BalanceService;
use crate::services::price::PriceService;
use crate::services::token::TokenCodec;

/// Error assembling the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("token TTL out of range: {0}")]
    TokenTtl(#[from] chrono::OutOfRangeError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Holds the store handle explicitly so that no
/// component reaches for a process-wide connection.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Store,
    tokens: TokenCodec,
    token_ttl: TimeDelta,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured token TTL does not fit a `TimeDelta`.
    pub fn new(config: &ServerConfig, store: Store) -> Result<Self, StateError> {
        let tokens = TokenCodec::new(config.token_secret.clone());
        let token_ttl = TimeDelta::from_std(config.token_ttl)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                store,
                tokens,
                token_ttl,
            }),
        })
    }

    /// Get a reference to the store handle.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.inner.store
    }

    /// Get a reference to the token codec.
    #[must_use]
    pub fn tokens(&self) -> &TokenCodec {
        &self.inner.tokens
    }

    /// Authentication service bound to this state.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self.store().pool(), self.tokens(), self.inner.token_ttl)
    }

    /// Balance service bound to this state.
    #[must_use]
    pub fn balances(&self) -> BalanceService<'_> {
        BalanceService::new(self.store())
    }

    /// Price service bound to this state.
    #[must_use]
    pub fn prices(&self) -> PriceService<'_> {
        PriceService::new(self.store())
    }
}
