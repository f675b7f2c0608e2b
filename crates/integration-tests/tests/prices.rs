//! Integration tests for price resolution.
//!
//! These tests require a `PostgreSQL` database at `TALLY_TEST_DATABASE_URL`.
//!
//! Run with: cargo test -p tally-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use tally_integration_tests::{TestContext, money};
use tally_server::services::price::{PriceError, PriceQuery, PriceService};

#[tokio::test]
#[ignore = "Requires running PostgreSQL database"]
async fn test_without_overwrite_price_is_untouched() {
    let ctx = TestContext::new().await;
    let item = ctx.create_item("5.00").await;

    let query =
        PriceQuery::from_fields(Some(item.as_str()), Some("19.99"), false).expect("query");
    let priced = PriceService::new(&ctx.store).resolve(query).await.expect("resolve");

    assert_eq!(priced.price, money("5"));
    assert_eq!(ctx.price(&item).await, Some(money("5")));
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL database"]
async fn test_overwrite_updates_price() {
    let ctx = TestContext::new().await;
    let item = ctx.create_item("5.00").await;

    let query = PriceQuery::from_fields(Some(item.as_str()), Some("19.99"), true).expect("query");
    let priced = PriceService::new(&ctx.store).resolve(query).await.expect("resolve");

    assert_eq!(priced.item_name, item);
    assert_eq!(priced.price, money("19.99"));
    assert_eq!(ctx.price(&item).await, Some(money("19.99")));
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL database"]
async fn test_unknown_item_is_not_found() {
    let ctx = TestContext::new().await;

    let query = PriceQuery::from_fields(Some("no-such-item-ever"), Some("1"), true).expect("query");
    let err = PriceService::new(&ctx.store).resolve(query).await.unwrap_err();

    assert!(matches!(err, PriceError::ItemNotFound(_)));
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL database"]
async fn test_overwritten_price_matches_stored_cents() {
    let ctx = TestContext::new().await;
    let item = ctx.create_item("5.00").await;

    let query = PriceQuery::from_fields(Some(item.as_str()), Some("0.125"), true).expect("query");
    let priced = PriceService::new(&ctx.store).resolve(query).await.expect("resolve");

    assert_eq!(priced.price.to_string(), "0.13");
    assert_eq!(ctx.price(&item).await, Some(priced.price));
}
