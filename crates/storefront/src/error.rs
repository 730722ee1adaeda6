//! Unified checkout error handling with Sentry integration.
//!
//! Every failure that reaches the user goes through [`CheckoutError`], which
//! knows how to phrase itself for the user ([`CheckoutError::user_message`])
//! and how to report itself ([`CheckoutError::report`]). Storage and identity
//! failures never get this far; they are logged and absorbed where they occur.

use shopkart_core::OwnerKey;
use thiserror::Error;

use crate::api::ApiError;
use crate::models::Claims;
use crate::services::checkout::CheckoutStage;
use crate::services::stock::OutOfStock;

/// Checkout-level error type for the storefront.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Input missing or unusable (no address, empty cart).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Some cart lines cannot be fulfilled.
    #[error("Out of stock: {0}")]
    Stock(OutOfStock),

    /// The stock check itself could not run.
    #[error("Inventory unavailable: {0}")]
    InventoryUnavailable(#[source] ApiError),

    /// The payment gateway refused or failed to create an intent.
    #[error("Payment gateway error: {0}")]
    Gateway(#[source] ApiError),

    /// The payment proof is for a different gateway order.
    #[error("Payment proof is for order {received}, expected {expected}")]
    ProofMismatch { expected: String, received: String },

    /// The backend did not accept the paid order.
    #[error("Order submission failed: {0}")]
    OrderSubmission(#[source] ApiError),

    /// Checkout requires a signed-in user.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The operation is not valid in the attempt's current stage.
    #[error("Cannot {action} while {stage}")]
    InvalidTransition {
        stage: CheckoutStage,
        action: &'static str,
    },
}

impl CheckoutError {
    /// Text safe to show the user.
    ///
    /// Gateway `detail` messages are passed through. Order submission
    /// details are not, since the backend fills them with exception text.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::Stock(_) => {
                "Some items are out of stock. Update your cart and try again.".to_string()
            }
            Self::InventoryUnavailable(_) => {
                "Could not check stock right now. Please try again.".to_string()
            }
            Self::Gateway(err) => err
                .detail()
                .map_or_else(|| "Payment could not be started.".to_string(), String::from),
            Self::ProofMismatch { .. } => {
                "We could not match your payment to this order. If you were charged, contact support with your payment reference.".to_string()
            }
            Self::OrderSubmission(_) => {
                "Your payment was received but the order could not be placed. Your cart has been kept; contact support with your payment reference.".to_string()
            }
            Self::NotAuthenticated => "Please sign in to check out.".to_string(),
            Self::InvalidTransition { .. } => "That step is not available right now.".to_string(),
        }
    }

    /// Whether this failure should reach error tracking.
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        matches!(
            self,
            Self::Gateway(_)
                | Self::ProofMismatch { .. }
                | Self::OrderSubmission(_)
                | Self::InventoryUnavailable(_)
        )
    }

    /// Log the error, sending service failures to Sentry.
    pub fn report(&self) {
        if self.is_reportable() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Checkout error"
            );
        } else {
            tracing::warn!(error = %self, "Checkout rejected");
        }
    }
}

/// Result type alias for `CheckoutError`.
pub type Result<T> = std::result::Result<T, CheckoutError>;

/// Associate subsequent Sentry events with the signed-in owner.
pub fn set_sentry_user(owner: &OwnerKey, claims: &Claims) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(owner.to_string()),
            email: claims.sub.clone(),
            username: claims.name.clone(),
            ..Default::default()
        }));
    });
}

/// Stop associating events with a user after sign-out.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| scope.set_user(None));
}

/// Record a user action for the trail attached to later Sentry events.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("variant_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let data = data
        .unwrap_or_default()
        .iter()
        .map(|(key, value)| ((*key).to_string(), serde_json::Value::from(*value)))
        .collect();

    sentry::add_breadcrumb(sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        data,
        ..Default::default()
    });
}
