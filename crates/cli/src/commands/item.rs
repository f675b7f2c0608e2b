//! Catalog provisioning command.
//!
//! # Usage
//!
//! ```bash
//! tally item set -n widget -p 19.99
//! ```

use tally_core::{ItemName, Money};
use tally_server::db::PriceRepository;

use super::{CliError, connect};

/// Insert an item or replace its price.
///
/// # Errors
///
/// Returns an error if the name or price is invalid or the database is
/// unreachable.
pub async fn set(name: &str, price: &str) -> Result<(), CliError> {
    let item = ItemName::parse(name)?;
    let price = Money::parse(price)?;

    let pool = connect().await?;
    PriceRepository::new(&pool).upsert(&item, price).await?;

    tracing::info!(item_name = %item, price = %price, "Price set");
    pool.close().await;
    Ok(())
}
