//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! tally migrate
//! ```
//!
//! # Environment Variables
//!
//! - `TALLY_DATABASE_URL` or `DATABASE_URL` - `PostgreSQL` connection string
//! - otherwise `DB_HOST`, `DB_PORT`, `DB_USERNAME`, `DB_PASSWORD`, `DB_NAME`
//!
//! Migrations live in `crates/server/migrations/`.

use super::{CliError, connect};

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    pool.close().await;
    Ok(())
}
