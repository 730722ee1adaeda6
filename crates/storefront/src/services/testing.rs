//! In-process backend used by service tests.

use std::cell::{Cell, RefCell};

use rust_decimal::Decimal;
use shopkart_core::{OrderId, OrderStatus, PaymentStatus, Price, VariantId};

use crate::api::{ApiError, InventoryApi, OrderApi, PaymentApi};
use crate::models::{OrderDraft, OrderRecord, PaymentIntent, VariantStock};

pub const INTENT_ORDER_ID: &str = "order_test_1";

/// Scripted backend that records every call.
#[derive(Default)]
pub struct FakeBackend {
    inventory: Vec<VariantStock>,
    inventory_error: Option<fn() -> ApiError>,
    intent_error: Option<fn() -> ApiError>,
    order_error: Option<fn() -> ApiError>,
    pub inventory_calls: Cell<usize>,
    pub intent_requests: RefCell<Vec<Price>>,
    pub submitted: RefCell<Vec<OrderDraft>>,
}

impl FakeBackend {
    pub fn with_stock<'a>(rows: impl IntoIterator<Item = (&'a str, i64)>) -> Self {
        Self {
            inventory: rows
                .into_iter()
                .map(|(id, stock)| VariantStock {
                    id: VariantId::new(id),
                    stock,
                    price: None,
                })
                .collect(),
            ..Self::default()
        }
    }

    pub fn with_price(mut self, id: &str, price: Decimal) -> Self {
        for row in &mut self.inventory {
            if row.id.as_str() == id {
                row.price = Some(price);
            }
        }
        self
    }

    pub fn failing_inventory(mut self, error: fn() -> ApiError) -> Self {
        self.inventory_error = Some(error);
        self
    }

    pub fn failing_intent(mut self, error: fn() -> ApiError) -> Self {
        self.intent_error = Some(error);
        self
    }

    pub fn failing_orders(mut self, error: fn() -> ApiError) -> Self {
        self.order_error = Some(error);
        self
    }
}

impl InventoryApi for FakeBackend {
    async fn variant_stock(&self, ids: &[VariantId]) -> Result<Vec<VariantStock>, ApiError> {
        self.inventory_calls.set(self.inventory_calls.get() + 1);
        if let Some(error) = self.inventory_error {
            return Err(error());
        }
        Ok(self
            .inventory
            .iter()
            .filter(|row| ids.contains(&row.id))
            .cloned()
            .collect())
    }
}

impl PaymentApi for FakeBackend {
    async fn create_payment_intent(&self, amount: &Price) -> Result<PaymentIntent, ApiError> {
        self.intent_requests.borrow_mut().push(*amount);
        if let Some(error) = self.intent_error {
            return Err(error());
        }
        Ok(PaymentIntent {
            order_id: INTENT_ORDER_ID.to_string(),
            amount: amount.minor_units().unwrap_or_default(),
            currency: amount.currency_code,
            receipt: None,
        })
    }
}

impl OrderApi for FakeBackend {
    async fn submit_order(&self, draft: &OrderDraft) -> Result<OrderRecord, ApiError> {
        self.submitted.borrow_mut().push(draft.clone());
        if let Some(error) = self.order_error {
            return Err(error());
        }
        Ok(OrderRecord {
            id: OrderId::new(1),
            shipping_address_id: Some(draft.address_id),
            total_amount: draft
                .order_lines
                .iter()
                .map(|l| l.price * Decimal::from(l.quantity))
                .sum(),
            order_status: OrderStatus::Pending,
            payment_status: PaymentStatus::Paid,
            created_at: None,
            description: None,
        })
    }
}
