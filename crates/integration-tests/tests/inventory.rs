//! Integration tests for the batched inventory lookup.
//!
//! These tests require a running backend (`SHOPKART_API_URL`). Some also need
//! `SHOPKART_TEST_VARIANT_ID`.

use rust_decimal::Decimal;
use shopkart_core::{CartLineInput, VariantId};
use shopkart_integration_tests::{api_config, context, test_variant_id};
use shopkart_storefront::api::{ApiClient, ApiError, InventoryApi};
use shopkart_storefront::services::StockValidator;

const UNKNOWN_VARIANT: &str = "987654321";

#[tokio::test]
#[ignore = "Requires running backend"]
async fn test_unknown_variants_are_not_found() {
    let api = ApiClient::new(&api_config());
    match api.variant_stock(&[VariantId::new(UNKNOWN_VARIANT)]).await {
        Ok(rows) => assert!(rows.is_empty()),
        Err(ApiError::NotFound(_)) => {}
        Err(e) => panic!("unexpected error: {e}"),
    }
}

#[tokio::test]
#[ignore = "Requires running backend"]
async fn test_unknown_variant_is_out_of_stock() {
    let mut ctx = context(None);
    ctx.cart_mut()
        .add_or_increment(CartLineInput::new("1", UNKNOWN_VARIANT, Decimal::ONE));
    let cart = ctx.cart_mut().load().clone();

    let api = ctx.api();
    let out = StockValidator::new(&api)
        .validate(&cart)
        .await
        .expect("stock check should run");
    assert!(out.contains(&VariantId::new(UNKNOWN_VARIANT)));
}

#[tokio::test]
#[ignore = "Requires running backend and SHOPKART_TEST_VARIANT_ID"]
async fn test_known_variant_reports_stock() {
    let Some(variant) = test_variant_id() else {
        return;
    };
    let api = ApiClient::new(&api_config());
    let rows = api
        .variant_stock(&[VariantId::new(variant.as_str())])
        .await
        .expect("lookup should succeed");

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id.as_str(), variant);
}
