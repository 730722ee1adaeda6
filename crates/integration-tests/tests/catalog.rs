//! Integration tests for catalog browsing.
//!
//! These tests require a running backend (`SHOPKART_API_URL`).

use shopkart_core::ProductId;
use shopkart_integration_tests::context;
use shopkart_storefront::api::ApiError;
use shopkart_storefront::models::ProductQuery;

#[tokio::test]
#[ignore = "Requires running backend"]
async fn test_product_listing_respects_limit() {
    let api = context(None).api();
    let query = ProductQuery {
        limit: 2,
        ..ProductQuery::default()
    };
    let products = api.products(&query).await.expect("listing should load");
    assert!(products.len() <= 2);
}

#[tokio::test]
#[ignore = "Requires running backend"]
async fn test_listed_product_has_detail() {
    let api = context(None).api();
    let products = api
        .products(&ProductQuery::default())
        .await
        .expect("listing should load");
    let Some(first) = products.first() else {
        return;
    };

    let product = api.product(&first.id).await.expect("detail should load");
    assert_eq!(product.id, first.id);
    for variant in &product.variants {
        let input = product.line_input(variant);
        assert_eq!(input.variant_id, variant.id);
    }
}

#[tokio::test]
#[ignore = "Requires running backend"]
async fn test_unknown_product_is_not_found() {
    let api = context(None).api();
    let err = api
        .product(&ProductId::new("987654321"))
        .await
        .expect_err("unknown product must fail");
    assert!(matches!(err, ApiError::NotFound(_)), "got {err:?}");
}

#[tokio::test]
#[ignore = "Requires running backend"]
async fn test_categories_and_suggestions_load() {
    let api = context(None).api();
    api.categories().await.expect("categories should load");
    let names = api
        .product_suggestions("a", 5)
        .await
        .expect("suggestions should load");
    assert!(names.len() <= 5);
}
