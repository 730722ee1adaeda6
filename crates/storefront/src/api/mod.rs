//! Backend REST API.
//!
//! # Architecture
//!
//! - [`ApiClient`] talks to the backend with `reqwest`
//! - The checkout core only depends on the narrow traits below, so tests and
//!   alternative transports can stand in for the backend
//! - Endpoints that act on behalf of a user send the credential as a bearer
//!   token
//!
//! # Endpoints
//!
//! | Trait / method | Endpoint |
//! |----------------|----------|
//! | [`InventoryApi`] | `POST /product/variants` |
//! | [`PaymentApi`] | `POST /payment/order` |
//! | [`OrderApi`] | `POST /orders` |
//! | [`ApiClient::addresses`] | `GET /account/addresses` |
//! | [`ApiClient::order_history`] | `GET /orders` |
//! | [`ApiClient::invoice`] | `GET /orders/{id}/invoice` |

mod client;

pub use client::ApiClient;

use shopkart_core::{Price, VariantId};
use thiserror::Error;

use crate::models::{OrderDraft, OrderRecord, PaymentIntent, VariantStock};

/// Errors that can occur when calling the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint path could not be resolved against the base URL.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// No credential, or the backend rejected it.
    #[error("Unauthorized")]
    Unauthorized,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success response.
    #[error("HTTP {status}: {detail}")]
    Status { status: u16, detail: String },
}

impl ApiError {
    /// Human-readable detail reported by the backend, if any.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::NotFound(detail) | Self::Status { detail, .. } if !detail.is_empty() => {
                Some(detail.as_str())
            }
            _ => None,
        }
    }
}

/// Batched stock lookup.
#[allow(async_fn_in_trait)]
pub trait InventoryApi {
    /// Fetch stock and price for every listed variant in one request.
    ///
    /// Variants the backend does not know are simply absent from the result.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the lookup fails.
    async fn variant_stock(&self, ids: &[VariantId]) -> Result<Vec<VariantStock>, ApiError>;
}

/// Payment intent creation.
#[allow(async_fn_in_trait)]
pub trait PaymentApi {
    /// Ask the gateway (via the backend) for an order to pay `amount` against.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the gateway cannot create the intent.
    async fn create_payment_intent(&self, amount: &Price) -> Result<PaymentIntent, ApiError>;
}

/// Order creation.
#[allow(async_fn_in_trait)]
pub trait OrderApi {
    /// Create an order from a paid draft.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the backend rejects the draft.
    async fn submit_order(&self, draft: &OrderDraft) -> Result<OrderRecord, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_only_for_backend_messages() {
        let err = ApiError::Status {
            status: 424,
            detail: "Gateway down".to_string(),
        };
        assert_eq!(err.detail(), Some("Gateway down"));
        assert_eq!(err.to_string(), "HTTP 424: Gateway down");

        assert_eq!(ApiError::Unauthorized.detail(), None);
        assert_eq!(ApiError::NotFound(String::new()).detail(), None);
    }
}
