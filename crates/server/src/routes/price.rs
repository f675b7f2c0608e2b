//! Price lookup handler.

use axum::{Json, extract::State};
use serde::Deserialize;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::routes::payload::{self, Payload, flag};
use crate::services::price::{PriceQuery, PricedItem};
use crate::state::AppState;

/// Price request fields.
#[derive(Debug, Deserialize)]
pub struct PriceForm {
    #[serde(default, deserialize_with = "payload::text")]
    item_name: Option<String>,
    #[serde(default, deserialize_with = "payload::text")]
    price: Option<String>,
    #[serde(default, deserialize_with = "payload::text")]
    overwrite: Option<String>,
    /// Older spelling of `overwrite`.
    #[serde(default, deserialize_with = "payload::text")]
    overlays: Option<String>,
}

impl PriceForm {
    /// Whether either overwrite flag is set.
    fn overwrites(&self) -> bool {
        flag(self.overwrite.as_deref()) || flag(self.overlays.as_deref())
    }
}

/// Look up an item's price, optionally overwriting it.
///
/// Fields: `item_name`, `price`, and `overwrite` or its older spelling
/// `overlays`.
pub async fn resolve(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
    Payload(form): Payload<PriceForm>,
) -> Result<Json<PricedItem>> {
    let overwrite = form.overwrites();
    let query =
        PriceQuery::from_fields(form.item_name.as_deref(), form.price.as_deref(), overwrite)?;

    tracing::debug!(user_id = %identity.id, item_name = %query.item, overwrite, "Resolving price");

    let priced = state.prices().resolve(query).await?;

    Ok(Json(priced))
}
