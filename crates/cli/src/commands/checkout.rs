//! Checkout command.

use shopkart_core::{AddressId, Price};
use shopkart_storefront::models::PaymentProof;
use shopkart_storefront::state::StorefrontContext;
use shopkart_storefront::storage::ClientStorage;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::CommandError;

/// What the user typed after paying.
enum GatewayReply {
    Paid(PaymentProof),
    Failed(String),
    Cancel,
}

fn parse_reply(line: &str) -> Option<GatewayReply> {
    let line = line.trim();
    if line.eq_ignore_ascii_case("cancel") {
        return Some(GatewayReply::Cancel);
    }
    if let Some(reason) = line.strip_prefix("failed") {
        return Some(GatewayReply::Failed(reason.trim().to_string()));
    }

    let mut parts = line.split_whitespace();
    let (Some(payment_id), Some(order_id), Some(signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };
    Some(GatewayReply::Paid(PaymentProof {
        payment_id: payment_id.to_string(),
        order_id: order_id.to_string(),
        signature: signature.to_string(),
    }))
}

/// Run a full checkout: stock check, payment intent, wait for the gateway's
/// proof on stdin, submit the order.
///
/// # Errors
///
/// Returns `CommandError::Checkout` for any rejected or failed step.
pub async fn run<S: ClientStorage>(
    ctx: &mut StorefrontContext<S>,
    address: Option<AddressId>,
) -> Result<(), CommandError> {
    let result = checkout(ctx, address).await;
    if let Err(CommandError::Checkout(e)) = &result {
        e.report();
    }
    result
}

async fn checkout<S: ClientStorage>(
    ctx: &mut StorefrontContext<S>,
    address: Option<AddressId>,
) -> Result<(), CommandError> {
    let mut checkout = ctx.checkout()?;
    checkout.select_address(address)?;

    let api = ctx.api();
    let intent = checkout.request_payment_intent(ctx.cart_mut(), &api).await?;

    tracing::info!("Payment requested: {}", intent.price());
    tracing::info!("  Gateway order: {}", intent.order_id);
    if let Some(key_id) = &ctx.config().gateway_key_id {
        tracing::info!("  Gateway key:   {key_id}");
    }
    tracing::info!("Complete the payment, then enter `<payment_id> <order_id> <signature>`");
    tracing::info!("(or `failed <reason>` if the payment did not go through, or `cancel`)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let proof = loop {
        let Some(line) = lines.next_line().await? else {
            checkout.cancel()?;
            tracing::info!("Input closed, checkout cancelled");
            return Ok(());
        };
        match parse_reply(&line) {
            Some(GatewayReply::Paid(proof)) => break proof,
            Some(GatewayReply::Failed(reason)) => {
                checkout.payment_failed(&reason)?;
                tracing::warn!("Payment failed: {reason}. Your cart has been kept.");
                return Ok(());
            }
            Some(GatewayReply::Cancel) => {
                checkout.cancel()?;
                tracing::info!("Checkout cancelled");
                return Ok(());
            }
            None => tracing::warn!("Expected three values: <payment_id> <order_id> <signature>"),
        }
    };

    let order = checkout
        .complete_payment(proof, ctx.cart_mut(), &api)
        .await?;
    tracing::info!(
        "Order {} placed: {} ({})",
        order.id,
        Price::new(order.total_amount, ctx.config().pricing.currency),
        order.payment_status
    );
    Ok(())
}
