//! Order, address and order-draft types.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shopkart_core::{AddressId, Cart, OrderId, OrderStatus, PaymentStatus, VariantId};

use super::payment::PaymentProof;

/// A saved shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub address_line1: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip_code: Option<i64>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl Address {
    /// One-line label for pickers, e.g. `Home: 12 MG Road, Pune 411001`.
    #[must_use]
    pub fn label(&self) -> String {
        let mut parts: Vec<String> = [&self.address_line1, &self.city]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .cloned()
            .collect();
        if let Some(zip) = self.zip_code {
            match parts.last_mut() {
                Some(last) => last.push_str(&format!(" {zip}")),
                None => parts.push(zip.to_string()),
            }
        }

        let body = parts.join(", ");
        match self.alias.as_deref().filter(|a| !a.is_empty()) {
            Some(alias) => format!("{alias}: {body}"),
            None => body,
        }
    }
}

/// One line of an order draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    pub variant_id: VariantId,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// Payload that turns a paid cart into an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDraft {
    pub payment_id: String,
    pub address_id: AddressId,
    pub payment_order_id: String,
    pub payment_signature: String,
    pub order_lines: Vec<OrderLine>,
}

impl OrderDraft {
    /// Build a draft from the cart as it is at submission time.
    #[must_use]
    pub fn new(proof: &PaymentProof, address_id: AddressId, cart: &Cart) -> Self {
        Self {
            payment_id: proof.payment_id.clone(),
            address_id,
            payment_order_id: proof.order_id.clone(),
            payment_signature: proof.signature.clone(),
            order_lines: cart
                .lines()
                .iter()
                .map(|line| OrderLine {
                    variant_id: line.variant_id.clone(),
                    quantity: line.quantity,
                    price: line.unit_price,
                })
                .collect(),
        }
    }
}

/// An order as recorded by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    #[serde(default)]
    pub shipping_address_id: Option<AddressId>,
    pub total_amount: Decimal,
    #[serde(default)]
    pub order_status: OrderStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A page of the order history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderHistory {
    /// Total number of orders across all pages.
    pub total: u64,
    pub orders: Vec<OrderRecord>,
}

#[cfg(test)]
mod tests {
    use shopkart_core::CartLineInput;

    use super::*;

    #[test]
    fn test_draft_wire_shape() {
        let mut cart = Cart::new();
        cart.add_or_increment(CartLineInput::new("3", "7", Decimal::new(4995, 1)).with_quantity(2));

        let proof = PaymentProof {
            payment_id: "pay_1".to_string(),
            order_id: "order_1".to_string(),
            signature: "sig".to_string(),
        };
        let draft = OrderDraft::new(&proof, AddressId::new(5), &cart);

        assert_eq!(
            serde_json::to_value(&draft).expect("serialize"),
            serde_json::json!({
                "payment_id": "pay_1",
                "address_id": 5,
                "payment_order_id": "order_1",
                "payment_signature": "sig",
                "order_lines": [{"variant_id": "7", "quantity": 2, "price": 499.5}]
            })
        );
    }

    #[test]
    fn test_order_record_from_backend() {
        let order: OrderRecord = serde_json::from_str(
            r#"{"id": 11, "user_id": 4, "shipping_address_id": 5, "total_amount": 1019.0,
                "order_status": "pending", "payment_status": "paid",
                "created_at": "2025-03-01T10:15:30.123456"}"#,
        )
        .expect("parse");
        assert_eq!(order.id, OrderId::new(11));
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.total_amount, Decimal::from(1019));
        assert!(order.created_at.is_some());
    }

    #[test]
    fn test_address_label() {
        let address = Address {
            id: AddressId::new(1),
            alias: Some("Home".to_string()),
            address_line1: Some("12 MG Road".to_string()),
            city: Some("Pune".to_string()),
            state: None,
            zip_code: Some(411_001),
            phone: None,
        };
        assert_eq!(address.label(), "Home: 12 MG Road, Pune 411001");
    }
}
