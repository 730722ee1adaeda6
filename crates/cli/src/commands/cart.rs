//! Cart commands.

use rust_decimal::Decimal;
use shopkart_core::{CartLineInput, Price, ProductId, VariantId};
use shopkart_storefront::error::add_breadcrumb;
use shopkart_storefront::services::StockValidator;
use shopkart_storefront::state::StorefrontContext;
use shopkart_storefront::storage::ClientStorage;

use super::CommandError;

/// Arguments of `cart add`.
///
/// Without a price, the line is filled from the catalog.
pub struct NewLine {
    pub product: String,
    pub variant: String,
    pub price: Option<Decimal>,
    pub qty: Option<u32>,
    pub name: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
}

/// Print the cart and its totals.
pub fn show<S: ClientStorage>(ctx: &mut StorefrontContext<S>) {
    let pricing = ctx.config().pricing;
    let owner = ctx.cart().owner();
    let cart = ctx.cart_mut();

    if cart.load().is_empty() {
        tracing::info!("Cart for {owner} is empty");
        return;
    }

    tracing::info!("Cart for {owner}:");
    for line in cart.load().lines() {
        let label = if line.display_name.is_empty() {
            format!("product {} / variant {}", line.product_id, line.variant_id)
        } else {
            format!("{} (variant {})", line.display_name, line.variant_id)
        };
        let options: Vec<&str> = [line.size.as_str(), line.color.as_str()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect();
        let options = if options.is_empty() {
            String::new()
        } else {
            format!(" [{}]", options.join(", "))
        };
        tracing::info!(
            "  {} x {}{} @ {} = {}",
            line.quantity,
            label,
            options,
            Price::new(line.unit_price, pricing.currency),
            Price::new(line.line_total(), pricing.currency)
        );
    }

    let summary = cart.summary(&pricing);
    tracing::info!("  Items:        {}", summary.item_count);
    tracing::info!("  Subtotal:     {}", summary.subtotal);
    tracing::info!("  Platform fee: {}", summary.platform_fee);
    if summary.free_shipping() {
        tracing::info!("  Shipping:     free");
    } else {
        tracing::info!("  Shipping:     {}", summary.shipping);
    }
    tracing::info!("  Total:        {}", summary.total);
}

/// Look the variant up in the catalog and build its cart line.
async fn catalog_line<S: ClientStorage>(
    ctx: &StorefrontContext<S>,
    product_id: ProductId,
    variant_id: VariantId,
) -> Result<CartLineInput, CommandError> {
    let product = ctx.api().product(&product_id).await?;
    let variant = product
        .variant(&variant_id)
        .ok_or_else(|| CommandError::UnknownVariant {
            product: product_id.to_string(),
            variant: variant_id.to_string(),
        })?;
    if !variant.in_stock() {
        return Err(CommandError::OutOfStock(variant_id.to_string()));
    }
    Ok(product.line_input(variant))
}

/// Add a line or increase its quantity.
///
/// # Errors
///
/// Without `--price`, returns `CommandError::UnknownVariant` or
/// `CommandError::OutOfStock` if the catalog cannot supply the line, or any
/// backend error.
pub async fn add<S: ClientStorage>(
    ctx: &mut StorefrontContext<S>,
    line: NewLine,
) -> Result<(), CommandError> {
    let product_id = ProductId::new(line.product.as_str());
    let variant_id = VariantId::new(line.variant.as_str());
    let mut input = match line.price {
        Some(price) => CartLineInput::new(product_id, variant_id, price),
        None => catalog_line(ctx, product_id, variant_id).await?,
    };

    if let Some(qty) = line.qty {
        input = input.with_quantity(qty);
    }
    if let Some(name) = line.name {
        input = input.with_name(name);
    }
    if let Some(size) = line.size {
        input.size = size;
    }
    if let Some(color) = line.color {
        input.color = color;
    }

    add_breadcrumb("cart", "Added item", Some(&[("variant_id", line.variant.as_str())]));
    let cart = ctx.cart_mut();
    cart.add_or_increment(input);
    tracing::info!("Cart now has {} item(s)", cart.item_count());
    Ok(())
}

/// Decrease a line by `by`.
pub fn decrement<S: ClientStorage>(
    ctx: &mut StorefrontContext<S>,
    product: &str,
    variant: &str,
    by: u32,
) {
    let cart = ctx.cart_mut();
    if cart.decrement_or_remove(&ProductId::new(product), &VariantId::new(variant), by) {
        tracing::info!("Cart now has {} item(s)", cart.item_count());
    } else {
        tracing::warn!("Variant {variant} of product {product} is not in the cart");
    }
}

/// Remove a line.
pub fn remove<S: ClientStorage>(ctx: &mut StorefrontContext<S>, product: &str, variant: &str) {
    let cart = ctx.cart_mut();
    if cart.remove(&ProductId::new(product), &VariantId::new(variant)) {
        tracing::info!("Removed. Cart now has {} item(s)", cart.item_count());
    } else {
        tracing::warn!("Variant {variant} of product {product} is not in the cart");
    }
}

/// Empty the cart.
pub fn clear<S: ClientStorage>(ctx: &mut StorefrontContext<S>) {
    ctx.cart_mut().clear();
    tracing::info!("Cart cleared");
}

/// Check the cart against current stock and prices.
///
/// # Errors
///
/// Returns `CommandError::Checkout` if stock cannot be checked.
pub async fn check<S: ClientStorage>(ctx: &mut StorefrontContext<S>) -> Result<(), CommandError> {
    let api = ctx.api();
    let cart = ctx.cart_mut().load().clone();

    let report = StockValidator::new(&api).report(&cart).await?;

    if report.is_clear() {
        tracing::info!("All {} line(s) are in stock", cart.len());
    } else {
        for variant_id in &report.out_of_stock {
            tracing::warn!("Out of stock: variant {variant_id}");
        }
    }
    for change in &report.price_changes {
        tracing::warn!(
            "Price changed for variant {}: {} -> {}",
            change.variant_id,
            change.cart_price,
            change.current_price
        );
    }
    Ok(())
}
