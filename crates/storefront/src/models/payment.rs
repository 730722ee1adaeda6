//! Payment gateway handoff types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shopkart_core::{CurrencyCode, Price};

/// Request body for creating a payment intent.
///
/// `amount` is in the currency's standard unit; the backend converts it to
/// minor units for the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentIntentRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: CurrencyCode,
}

impl From<&Price> for PaymentIntentRequest {
    fn from(price: &Price) -> Self {
        Self {
            amount: price.amount,
            currency: price.currency_code,
        }
    }
}

/// A gateway order awaiting payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Gateway order identifier the payment must be made against.
    pub order_id: String,
    /// Amount in minor units (paise, cents).
    pub amount: i64,
    pub currency: CurrencyCode,
    #[serde(default)]
    pub receipt: Option<String>,
}

impl PaymentIntent {
    /// The intent amount as a [`Price`].
    #[must_use]
    pub fn price(&self) -> Price {
        Price::from_minor_units(self.amount, self.currency)
    }
}

/// Proof of payment delivered by the gateway's completion callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentProof {
    pub payment_id: String,
    /// Gateway order the payment was made against.
    pub order_id: String,
    pub signature: String,
}
