//! Balance mutation handler.

use axum::extract::State;
use serde::Deserialize;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::routes::payload::{self, Payload};
use crate::services::balance::BalanceMutation;
use crate::state::AppState;

/// Balance request fields.
#[derive(Debug, Deserialize)]
pub struct BalanceForm {
    /// Absolute value to set.
    #[serde(default, deserialize_with = "payload::text")]
    balance: Option<String>,
    /// Signed delta to apply.
    #[serde(default, deserialize_with = "payload::text")]
    amount: Option<String>,
}

/// Set or adjust the caller's balance.
///
/// Fields: `balance` (absolute, wins when present) or `amount` (signed delta).
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
    Payload(form): Payload<BalanceForm>,
) -> Result<String> {
    let mutation = BalanceMutation::from_fields(form.balance.as_deref(), form.amount.as_deref())?;

    let new_balance = state.balances().mutate(identity.id, mutation).await?;

    Ok(format!("balance updated, new balance: {new_balance}"))
}
