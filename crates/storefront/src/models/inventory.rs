//! Inventory wire types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shopkart_core::VariantId;

/// Request body for the batched variant lookup.
#[derive(Debug, Serialize)]
pub struct VariantLookupRequest<'a> {
    pub ids: &'a [VariantId],
}

/// Authoritative stock and price for one variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantStock {
    pub id: VariantId,
    /// Units available. May be negative if the backend oversold.
    pub stock: i64,
    #[serde(default)]
    pub price: Option<Decimal>,
}
