//! CLI subcommands.

pub mod item;
pub mod migrate;
pub mod user;

use sqlx::PgPool;
use thiserror::Error;

use tally_core::{ItemNameError, MoneyError};
use tally_server::config::{ConfigError, DatabaseConfig};
use tally_server::db::{self, RepositoryError};
use tally_server::services::auth::AuthError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Store settings are missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Repository operation failed.
    #[error("{0}")]
    Repository(#[from] RepositoryError),

    /// Password rejected or could not be hashed.
    #[error("{0}")]
    Auth(#[from] AuthError),

    /// Amount argument is not a number.
    #[error("Invalid amount: {0}")]
    Amount(#[from] MoneyError),

    /// Item name argument is invalid.
    #[error("Invalid item name: {0}")]
    ItemName(#[from] ItemNameError),
}

/// Connect to the store configured in the environment.
async fn connect() -> Result<PgPool, CliError> {
    dotenvy::dotenv().ok();

    let config = DatabaseConfig::from_env()?;

    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&config.url, config.connect_timeout).await?)
}
