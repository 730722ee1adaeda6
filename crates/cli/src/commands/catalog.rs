//! Catalog browsing commands.

use shopkart_core::{CurrencyCode, Price, ProductId};
use shopkart_storefront::models::{Product, ProductQuery};
use shopkart_storefront::state::StorefrontContext;
use shopkart_storefront::storage::ClientStorage;

use super::CommandError;

/// List product categories.
///
/// # Errors
///
/// Returns `CommandError::Api` if the backend request fails.
pub async fn categories<S: ClientStorage>(ctx: &StorefrontContext<S>) -> Result<(), CommandError> {
    let categories = ctx.api().categories().await?;
    if categories.is_empty() {
        tracing::info!("No categories");
    }
    for category in categories {
        tracing::info!("  [{}] {}", category.id, category.name);
    }
    Ok(())
}

/// List one page of products.
///
/// # Errors
///
/// Returns `CommandError::Api` if the backend request fails.
pub async fn list<S: ClientStorage>(
    ctx: &StorefrontContext<S>,
    query: &ProductQuery,
) -> Result<(), CommandError> {
    let currency = ctx.config().pricing.currency;
    let products = ctx.api().products(query).await?;

    if products.is_empty() {
        tracing::info!("No products match");
        return Ok(());
    }
    for product in &products {
        tracing::info!(
            "  [{}] {}{} {}",
            product.id,
            product.name,
            product
                .brand
                .as_deref()
                .map(|b| format!(" ({b})"))
                .unwrap_or_default(),
            Price::new(product.price, currency)
        );
    }
    if u32::try_from(products.len()).is_ok_and(|n| n == query.limit) {
        tracing::info!(
            "More results: --offset {}",
            query.offset.saturating_add(query.limit)
        );
    }
    Ok(())
}

fn describe(product: &Product, currency: CurrencyCode) {
    tracing::info!("{} [{}]", product.name, product.id);
    if let Some(brand) = &product.brand {
        tracing::info!("  Brand: {brand}");
    }
    if let Some(description) = product.description.as_deref().filter(|d| !d.is_empty()) {
        tracing::info!("  {description}");
    }

    if product.variants.is_empty() {
        tracing::info!("  No variants available");
        return;
    }
    tracing::info!("  Variants:");
    for variant in &product.variants {
        let options: Vec<&str> = [variant.size.as_deref(), variant.color.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect();
        tracing::info!(
            "    [{}] {} {} ({})",
            variant.id,
            options.join(" / "),
            Price::new(variant.price, currency),
            if variant.in_stock() {
                "in stock"
            } else {
                "out of stock"
            }
        );
    }
}

/// Show a product and its variants.
///
/// # Errors
///
/// Returns `CommandError::Api` if the product does not exist or the request
/// fails.
pub async fn show<S: ClientStorage>(
    ctx: &StorefrontContext<S>,
    product_id: &str,
) -> Result<(), CommandError> {
    let product = ctx.api().product(&ProductId::new(product_id)).await?;
    describe(&product, ctx.config().pricing.currency);
    Ok(())
}

/// Suggest product names for a partial search term.
///
/// # Errors
///
/// Returns `CommandError::Api` if the backend request fails.
pub async fn suggest<S: ClientStorage>(
    ctx: &StorefrontContext<S>,
    term: &str,
    limit: u32,
) -> Result<(), CommandError> {
    if term.trim().is_empty() {
        return Ok(());
    }
    let names = ctx.api().product_suggestions(term.trim(), limit).await?;
    if names.is_empty() {
        tracing::info!("No suggestions");
    }
    for name in names {
        tracing::info!("  {name}");
    }
    Ok(())
}
