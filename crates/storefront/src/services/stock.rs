//! Pre-checkout stock validation.
//!
//! The cart is checked against authoritative inventory in one batched
//! request. A variant is out of stock when the backend does not report it at
//! all, or reports fewer units than the cart asks for. Results are never
//! cached: every check goes to the backend.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use rust_decimal::Decimal;
use shopkart_core::{Cart, VariantId};
use tracing::{debug, instrument, warn};

use crate::api::{ApiError, InventoryApi};
use crate::error::CheckoutError;
use crate::models::VariantStock;

// =============================================================================
// Results
// =============================================================================

/// Variants that cannot be fulfilled at the requested quantity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutOfStock(BTreeSet<VariantId>);

impl OutOfStock {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn contains(&self, variant_id: &VariantId) -> bool {
        self.0.contains(variant_id)
    }

    /// Variant ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &VariantId> {
        self.0.iter()
    }
}

impl FromIterator<VariantId> for OutOfStock {
    fn from_iter<T: IntoIterator<Item = VariantId>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a OutOfStock {
    type Item = &'a VariantId;
    type IntoIter = std::collections::btree_set::Iter<'a, VariantId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for OutOfStock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<&str> = self.0.iter().map(VariantId::as_str).collect();
        write!(f, "variants {}", ids.join(", "))
    }
}

/// A cart price that no longer matches the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceChange {
    pub variant_id: VariantId,
    pub cart_price: Decimal,
    pub current_price: Decimal,
}

/// Full outcome of a stock check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockReport {
    pub out_of_stock: OutOfStock,
    pub price_changes: Vec<PriceChange>,
}

impl StockReport {
    /// Nothing blocks checkout.
    #[must_use]
    pub fn is_clear(&self) -> bool {
        self.out_of_stock.is_empty()
    }
}

// =============================================================================
// Validator
// =============================================================================

/// Checks carts against an inventory backend.
pub struct StockValidator<'a, I> {
    inventory: &'a I,
}

impl<'a, I: InventoryApi> StockValidator<'a, I> {
    #[must_use]
    pub const fn new(inventory: &'a I) -> Self {
        Self { inventory }
    }

    /// Variants in `cart` that cannot be fulfilled.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InventoryUnavailable` if the lookup fails.
    pub async fn validate(&self, cart: &Cart) -> Result<OutOfStock, CheckoutError> {
        Ok(self.report(cart).await?.out_of_stock)
    }

    /// Stock and price check for `cart`.
    ///
    /// An empty cart is clear without a backend call.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InventoryUnavailable` if the lookup fails.
    #[instrument(skip(self, cart), fields(lines = cart.len()))]
    pub async fn report(&self, cart: &Cart) -> Result<StockReport, CheckoutError> {
        if cart.is_empty() {
            return Ok(StockReport::default());
        }

        let ids: Vec<VariantId> = cart.quantities_by_variant().into_keys().collect();

        let inventory = match self.inventory.variant_stock(&ids).await {
            Ok(rows) => rows,
            // The backend answers 404 when none of the ids exist.
            Err(ApiError::NotFound(detail)) => {
                debug!(detail = %detail, "No requested variants found");
                Vec::new()
            }
            Err(e) => return Err(CheckoutError::InventoryUnavailable(e)),
        };

        let report = classify(cart, &inventory);
        if !report.out_of_stock.is_empty() {
            debug!(out_of_stock = %report.out_of_stock, "Stock check failed");
        }
        for change in &report.price_changes {
            warn!(
                variant_id = %change.variant_id,
                cart_price = %change.cart_price,
                current_price = %change.current_price,
                "Cart price differs from catalog"
            );
        }
        Ok(report)
    }
}

/// Compare `cart` against inventory rows.
///
/// Requested quantity is summed over all lines sharing a variant. When the
/// backend repeats a variant, the first row wins.
#[must_use]
pub fn classify(cart: &Cart, inventory: &[VariantStock]) -> StockReport {
    let mut available: BTreeMap<&VariantId, &VariantStock> = BTreeMap::new();
    for row in inventory {
        available.entry(&row.id).or_insert(row);
    }

    let out_of_stock = cart
        .quantities_by_variant()
        .into_iter()
        .filter(|(variant_id, requested)| {
            available.get(variant_id).is_none_or(|row| {
                row.stock < i64::try_from(*requested).unwrap_or(i64::MAX)
            })
        })
        .map(|(variant_id, _)| variant_id)
        .collect();

    let mut seen = BTreeSet::new();
    let price_changes = cart
        .lines()
        .iter()
        .filter(|line| seen.insert(&line.variant_id))
        .filter_map(|line| {
            let current = available.get(&line.variant_id)?.price?;
            (current != line.unit_price).then(|| PriceChange {
                variant_id: line.variant_id.clone(),
                cart_price: line.unit_price,
                current_price: current,
            })
        })
        .collect();

    StockReport {
        out_of_stock,
        price_changes,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shopkart_core::CartLineInput;

    use super::*;
    use crate::services::testing::FakeBackend;

    fn cart(lines: &[(&str, &str, u32)]) -> Cart {
        let mut cart = Cart::new();
        for (product, variant, qty) in lines {
            cart.add_or_increment(
                CartLineInput::new(*product, *variant, Decimal::new(100, 0)).with_quantity(*qty),
            );
        }
        cart
    }

    fn ids(out: &OutOfStock) -> Vec<&str> {
        out.iter().map(VariantId::as_str).collect()
    }

    #[tokio::test]
    async fn test_short_stock_is_out() {
        let backend = FakeBackend::with_stock([("v1", 1)]);
        let out = StockValidator::new(&backend)
            .validate(&cart(&[("p1", "v1", 2)]))
            .await
            .unwrap();
        assert_eq!(ids(&out), ["v1"]);
    }

    #[tokio::test]
    async fn test_enough_stock_is_clear() {
        let backend = FakeBackend::with_stock([("v1", 5)]);
        let out = StockValidator::new(&backend)
            .validate(&cart(&[("p1", "v1", 2)]))
            .await
            .unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_exact_stock_is_clear() {
        let backend = FakeBackend::with_stock([("v1", 2)]);
        let out = StockValidator::new(&backend)
            .validate(&cart(&[("p1", "v1", 2)]))
            .await
            .unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_missing_variant_is_out() {
        let backend = FakeBackend::with_stock([("v1", 9)]);
        let out = StockValidator::new(&backend)
            .validate(&cart(&[("p1", "v1", 1), ("p2", "v2", 1)]))
            .await
            .unwrap();
        assert_eq!(ids(&out), ["v2"]);
        assert_eq!(backend.inventory_calls.get(), 1);
    }

    #[tokio::test]
    async fn test_empty_cart_makes_no_call() {
        let backend = FakeBackend::default();
        let out = StockValidator::new(&backend)
            .validate(&Cart::new())
            .await
            .unwrap();
        assert!(out.is_empty());
        assert_eq!(backend.inventory_calls.get(), 0);
    }

    #[tokio::test]
    async fn test_not_found_means_everything_out() {
        let backend =
            FakeBackend::default().failing_inventory(|| ApiError::NotFound("No variants found".into()));
        let out = StockValidator::new(&backend)
            .validate(&cart(&[("p1", "v1", 1), ("p2", "v2", 1)]))
            .await
            .unwrap();
        assert_eq!(ids(&out), ["v1", "v2"]);
    }

    #[tokio::test]
    async fn test_backend_failure_is_unavailable() {
        let backend = FakeBackend::default().failing_inventory(|| ApiError::Status {
            status: 500,
            detail: String::new(),
        });
        let err = StockValidator::new(&backend)
            .validate(&cart(&[("p1", "v1", 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::InventoryUnavailable(_)));
    }

    #[tokio::test]
    async fn test_report_carries_catalog_price_changes() {
        let backend = FakeBackend::with_stock([("v1", 4), ("v2", 4)])
            .with_price("v1", Decimal::new(100, 0))
            .with_price("v2", Decimal::new(85, 0));
        let report = StockValidator::new(&backend)
            .report(&cart(&[("p1", "v1", 1), ("p2", "v2", 1)]))
            .await
            .unwrap();

        assert!(report.is_clear());
        let [change] = report.price_changes.as_slice() else {
            panic!("expected one price change, got {:?}", report.price_changes);
        };
        assert_eq!(change.variant_id.as_str(), "v2");
        assert_eq!(change.current_price, Decimal::new(85, 0));
    }

    #[test]
    fn test_duplicate_lines_are_summed() {
        let mut merged = cart(&[("p1", "v1", 2)]);
        merged.append(cart(&[("p1", "v1", 2)]));

        let inventory = [VariantStock {
            id: VariantId::new("v1"),
            stock: 3,
            price: None,
        }];
        assert_eq!(ids(&classify(&merged, &inventory).out_of_stock), ["v1"]);
    }

    #[test]
    fn test_price_drift_reported_once_per_variant() {
        let mut merged = cart(&[("p1", "v1", 1)]);
        merged.append(cart(&[("p1", "v1", 1)]));

        let inventory = [VariantStock {
            id: VariantId::new("v1"),
            stock: 10,
            price: Some(Decimal::new(120, 0)),
        }];
        let report = classify(&merged, &inventory);
        assert!(report.is_clear());
        assert_eq!(
            report.price_changes,
            [PriceChange {
                variant_id: VariantId::new("v1"),
                cart_price: Decimal::new(100, 0),
                current_price: Decimal::new(120, 0),
            }]
        );
    }

    #[test]
    fn test_out_of_stock_display() {
        let out = OutOfStock::from_iter([VariantId::new("9"), VariantId::new("10")]);
        assert_eq!(out.to_string(), "variants 10, 9");
    }
}
