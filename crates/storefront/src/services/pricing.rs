//! Order totals.
//!
//! The only charges on top of the cart subtotal are flat: a platform fee per
//! order and shipping, which is currently waived.

use rust_decimal::Decimal;
use serde::Serialize;
use shopkart_core::{Cart, CurrencyCode, Price};

/// Platform fee charged on every order, in the order currency.
pub const DEFAULT_PLATFORM_FEE: Decimal = Decimal::from_parts(20, 0, 0, false, 0);

/// Flat charges and currency applied at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pricing {
    pub platform_fee: Decimal,
    pub currency: CurrencyCode,
}

impl Pricing {
    #[must_use]
    pub const fn new(platform_fee: Decimal, currency: CurrencyCode) -> Self {
        Self {
            platform_fee,
            currency,
        }
    }

    /// Summarize `cart` under these charges.
    #[must_use]
    pub fn summarize(&self, cart: &Cart) -> OrderSummary {
        OrderSummary::for_cart(cart, self)
    }
}

impl Default for Pricing {
    fn default() -> Self {
        Self::new(DEFAULT_PLATFORM_FEE, CurrencyCode::default())
    }
}

/// Price breakdown shown before payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderSummary {
    /// Total units across all lines.
    pub item_count: u64,
    pub subtotal: Price,
    pub platform_fee: Price,
    pub shipping: Price,
    pub total: Price,
}

impl OrderSummary {
    #[must_use]
    pub fn for_cart(cart: &Cart, pricing: &Pricing) -> Self {
        let subtotal = cart.subtotal();
        let shipping = Decimal::ZERO;
        let currency = pricing.currency;

        Self {
            item_count: cart.total_quantity(),
            subtotal: Price::new(subtotal, currency),
            platform_fee: Price::new(pricing.platform_fee, currency),
            shipping: Price::new(shipping, currency),
            total: Price::new(subtotal + pricing.platform_fee + shipping, currency),
        }
    }

    /// Whether shipping is free for this order.
    #[must_use]
    pub fn free_shipping(&self) -> bool {
        self.shipping.amount.is_zero()
    }
}
