//! Order history commands.

use std::path::Path;

use shopkart_core::{OrderId, Price};
use shopkart_storefront::state::StorefrontContext;
use shopkart_storefront::storage::ClientStorage;

use super::CommandError;

/// Print one page of order history.
///
/// # Errors
///
/// Returns `CommandError::NotSignedIn` for guests, or any backend error.
pub async fn list<S: ClientStorage>(
    ctx: &StorefrontContext<S>,
    limit: u32,
    offset: u32,
) -> Result<(), CommandError> {
    let api = ctx.api();
    if !api.is_authenticated() {
        return Err(CommandError::NotSignedIn);
    }

    let history = api.order_history(limit, offset).await?;
    if history.orders.is_empty() {
        tracing::info!("No orders");
        return Ok(());
    }

    let currency = ctx.config().pricing.currency;
    for order in &history.orders {
        let placed = order
            .created_at
            .map_or_else(|| "-".to_string(), |at| at.format("%Y-%m-%d %H:%M").to_string());
        tracing::info!(
            "  #{} {} {} order {}, payment {}",
            order.id,
            placed,
            Price::new(order.total_amount, currency),
            order.order_status,
            order.payment_status
        );
    }
    tracing::info!(
        "Showing {}-{} of {}",
        u64::from(offset) + 1,
        u64::from(offset) + u64::try_from(history.orders.len()).unwrap_or(u64::MAX),
        history.total
    );
    Ok(())
}

/// Save an order's invoice PDF to `out`.
///
/// # Errors
///
/// Returns `CommandError::NotSignedIn` for guests, or any backend or I/O
/// error.
pub async fn invoice<S: ClientStorage>(
    ctx: &StorefrontContext<S>,
    order_id: OrderId,
    out: &Path,
) -> Result<(), CommandError> {
    let api = ctx.api();
    if !api.is_authenticated() {
        return Err(CommandError::NotSignedIn);
    }

    let pdf = api.invoice(order_id).await?;
    tokio::fs::write(out, &pdf).await?;
    tracing::info!("Saved invoice for order {} to {} ({} bytes)", order_id, out.display(), pdf.len());
    Ok(())
}
