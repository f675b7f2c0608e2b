//! User provisioning command.
//!
//! # Usage
//!
//! ```bash
//! tally user create -u alice -p 'correct horse battery' --balance 100
//! ```

use tally_core::Money;
use tally_server::db::{BalanceRepository, UserRepository};
use tally_server::services::auth::{hash_password, validate_password};

use super::{CliError, connect};

/// Create a user and their balance row in one transaction.
///
/// # Errors
///
/// Returns an error if the password is too short, the balance is not a
/// number, the username is taken, or the database is unreachable.
pub async fn create(username: &str, password: &str, balance: &str) -> Result<(), CliError> {
    validate_password(password)?;
    let opening = Money::parse(balance)?;
    let password_hash = hash_password(password)?;

    let pool = connect().await?;
    let mut tx = pool.begin().await?;

    let user_id = UserRepository::create_in(&mut *tx, username.trim(), &password_hash).await?;
    BalanceRepository::new(&mut *tx).provision(user_id, opening).await?;

    tx.commit().await?;

    tracing::info!(user_id = %user_id, username = %username.trim(), opening = %opening, "User created");
    pool.close().await;
    Ok(())
}
