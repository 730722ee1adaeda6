//! Checkout handoff: address, payment intent, payment proof, order.
//!
//! A [`Checkout`] is one attempt at turning the signed-in user's cart into an
//! order. It moves through
//!
//! ```text
//! AwaitingAddress -> AwaitingPaymentIntent -> AwaitingPaymentProof
//!     -> SubmittingOrder -> Completed
//! ```
//!
//! and can end in `Failed` from any non-terminal stage. Until the order is
//! being submitted the attempt can be cancelled without side effects.
//!
//! The payment proof arrives from the gateway UI whenever the user finishes
//! paying; the attempt simply waits in `AwaitingPaymentProof` until
//! [`Checkout::complete_payment`] is called with it.

use std::fmt;

use shopkart_core::{AddressId, OwnerKey};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::api::{InventoryApi, OrderApi, PaymentApi};
use crate::error::{CheckoutError, add_breadcrumb};
use crate::models::{OrderDraft, OrderRecord, PaymentIntent, PaymentProof};
use crate::services::cart::CartStore;
use crate::services::pricing::{OrderSummary, Pricing};
use crate::services::stock::StockValidator;
use crate::storage::ClientStorage;

/// Where an attempt is, without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStage {
    AwaitingAddress,
    AwaitingPaymentIntent,
    AwaitingPaymentProof,
    SubmittingOrder,
    Completed,
    Failed,
    Cancelled,
}

impl CheckoutStage {
    /// No further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    #[must_use]
    pub const fn is_cancellable(self) -> bool {
        matches!(
            self,
            Self::AwaitingAddress | Self::AwaitingPaymentIntent | Self::AwaitingPaymentProof
        )
    }
}

impl fmt::Display for CheckoutStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AwaitingAddress => "awaiting address",
            Self::AwaitingPaymentIntent => "awaiting payment intent",
            Self::AwaitingPaymentProof => "awaiting payment proof",
            Self::SubmittingOrder => "submitting order",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// An attempt's stage together with what it has collected so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutState {
    AwaitingAddress,
    AwaitingPaymentIntent {
        address_id: AddressId,
    },
    AwaitingPaymentProof {
        address_id: AddressId,
        intent: PaymentIntent,
        summary: OrderSummary,
    },
    SubmittingOrder {
        address_id: AddressId,
        intent: PaymentIntent,
    },
    Completed {
        order: OrderRecord,
    },
    Failed {
        /// Stage the attempt was in when it failed.
        during: CheckoutStage,
        reason: String,
    },
    Cancelled,
}

impl CheckoutState {
    #[must_use]
    pub const fn stage(&self) -> CheckoutStage {
        match self {
            Self::AwaitingAddress => CheckoutStage::AwaitingAddress,
            Self::AwaitingPaymentIntent { .. } => CheckoutStage::AwaitingPaymentIntent,
            Self::AwaitingPaymentProof { .. } => CheckoutStage::AwaitingPaymentProof,
            Self::SubmittingOrder { .. } => CheckoutStage::SubmittingOrder,
            Self::Completed { .. } => CheckoutStage::Completed,
            Self::Failed { .. } => CheckoutStage::Failed,
            Self::Cancelled => CheckoutStage::Cancelled,
        }
    }
}

/// One checkout attempt.
#[derive(Debug)]
pub struct Checkout {
    attempt_id: Uuid,
    owner: OwnerKey,
    pricing: Pricing,
    state: CheckoutState,
}

impl Checkout {
    /// Begin a checkout for the signed-in owner of `cart`.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NotAuthenticated` for guests.
    pub fn start<S: ClientStorage>(
        cart: &CartStore<S>,
        pricing: Pricing,
    ) -> Result<Self, CheckoutError> {
        let owner = cart.owner();
        if owner.is_guest() {
            return Err(CheckoutError::NotAuthenticated);
        }

        let attempt_id = Uuid::new_v4();
        info!(attempt_id = %attempt_id, owner = %owner, "Checkout started");
        add_breadcrumb("checkout", "Checkout started", None);

        Ok(Self {
            attempt_id,
            owner,
            pricing,
            state: CheckoutState::AwaitingAddress,
        })
    }

    #[must_use]
    pub const fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }

    #[must_use]
    pub const fn state(&self) -> &CheckoutState {
        &self.state
    }

    #[must_use]
    pub const fn stage(&self) -> CheckoutStage {
        self.state.stage()
    }

    #[must_use]
    pub const fn pricing(&self) -> &Pricing {
        &self.pricing
    }

    /// The intent being paid, while payment is outstanding or being submitted.
    #[must_use]
    pub const fn intent(&self) -> Option<&PaymentIntent> {
        match &self.state {
            CheckoutState::AwaitingPaymentProof { intent, .. }
            | CheckoutState::SubmittingOrder { intent, .. } => Some(intent),
            _ => None,
        }
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Choose the shipping address.
    ///
    /// May be called again to change the address until payment is requested.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Validation` if no address is given, leaving
    /// the attempt where it was.
    #[instrument(skip(self), fields(attempt_id = %self.attempt_id))]
    pub fn select_address(&mut self, address_id: Option<AddressId>) -> Result<(), CheckoutError> {
        if !matches!(
            self.stage(),
            CheckoutStage::AwaitingAddress | CheckoutStage::AwaitingPaymentIntent
        ) {
            return Err(self.invalid("select an address"));
        }

        let address_id = address_id
            .ok_or_else(|| CheckoutError::Validation("Please select a shipping address".into()))?;

        self.state = CheckoutState::AwaitingPaymentIntent { address_id };
        Ok(())
    }

    /// Check stock, then ask the gateway for a payment intent covering the
    /// cart total plus fees.
    ///
    /// Stock problems and an unreachable inventory leave the attempt in
    /// `AwaitingPaymentIntent` so the step can be retried once the cart is
    /// fixed. A gateway failure ends the attempt.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Validation` for an empty cart,
    /// `CheckoutError::Stock` if anything is out of stock,
    /// `CheckoutError::InventoryUnavailable` if stock cannot be checked, and
    /// `CheckoutError::Gateway` if the intent cannot be created.
    #[instrument(skip_all, fields(attempt_id = %self.attempt_id))]
    pub async fn request_payment_intent<S, A>(
        &mut self,
        cart: &mut CartStore<S>,
        api: &A,
    ) -> Result<PaymentIntent, CheckoutError>
    where
        S: ClientStorage,
        A: InventoryApi + PaymentApi,
    {
        let CheckoutState::AwaitingPaymentIntent { address_id } = self.state else {
            return Err(self.invalid("request a payment intent"));
        };
        self.ensure_owner(cart)?;

        let snapshot = cart.load().clone();
        if snapshot.is_empty() {
            return Err(CheckoutError::Validation("Your cart is empty".into()));
        }

        let out_of_stock = StockValidator::new(api).validate(&snapshot).await?;
        if !out_of_stock.is_empty() {
            return Err(CheckoutError::Stock(out_of_stock));
        }

        let summary = self.pricing.summarize(&snapshot);
        let intent = match api.create_payment_intent(&summary.total).await {
            Ok(intent) => intent,
            Err(e) => {
                self.fail(CheckoutStage::AwaitingPaymentIntent, e.to_string());
                return Err(CheckoutError::Gateway(e));
            }
        };

        info!(
            gateway_order_id = %intent.order_id,
            total = %summary.total,
            "Payment intent created"
        );
        add_breadcrumb(
            "checkout",
            "Payment intent created",
            Some(&[("gateway_order_id", intent.order_id.as_str())]),
        );

        self.state = CheckoutState::AwaitingPaymentProof {
            address_id,
            intent: intent.clone(),
            summary,
        };
        Ok(intent)
    }

    /// Accept the gateway's payment proof and submit the order.
    ///
    /// On success the cart is cleared. On failure the cart is kept and the
    /// attempt ends.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::ProofMismatch` if the proof is for another
    /// gateway order, and `CheckoutError::OrderSubmission` if the backend
    /// rejects the order.
    #[instrument(skip_all, fields(attempt_id = %self.attempt_id, payment_id = %proof.payment_id))]
    pub async fn complete_payment<S, O>(
        &mut self,
        proof: PaymentProof,
        cart: &mut CartStore<S>,
        orders: &O,
    ) -> Result<OrderRecord, CheckoutError>
    where
        S: ClientStorage,
        O: OrderApi,
    {
        let CheckoutState::AwaitingPaymentProof {
            address_id,
            ref intent,
            ref summary,
        } = self.state
        else {
            return Err(self.invalid("complete payment"));
        };
        let intent = intent.clone();
        let quoted_total = summary.total;

        if proof.order_id != intent.order_id {
            let err = CheckoutError::ProofMismatch {
                expected: intent.order_id,
                received: proof.order_id,
            };
            self.fail(CheckoutStage::AwaitingPaymentProof, err.to_string());
            return Err(err);
        }
        self.ensure_owner(cart)?;

        let draft = OrderDraft::new(&proof, address_id, cart.load());
        let current_total = cart.summary(&self.pricing).total;
        if current_total != quoted_total {
            warn!(
                quoted = %quoted_total,
                current = %current_total,
                "Cart changed after payment intent was created"
            );
        }

        self.state = CheckoutState::SubmittingOrder { address_id, intent };

        match orders.submit_order(&draft).await {
            Ok(order) => {
                cart.clear();
                info!(order_id = %order.id, "Order placed");
                add_breadcrumb("checkout", "Order placed", None);
                self.state = CheckoutState::Completed {
                    order: order.clone(),
                };
                Ok(order)
            }
            Err(e) => {
                self.fail(CheckoutStage::SubmittingOrder, e.to_string());
                Err(CheckoutError::OrderSubmission(e))
            }
        }
    }

    /// The gateway reported that the user's payment did not go through.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InvalidTransition` unless payment is
    /// outstanding.
    #[instrument(skip(self), fields(attempt_id = %self.attempt_id))]
    pub fn payment_failed(&mut self, reason: &str) -> Result<(), CheckoutError> {
        if self.stage() != CheckoutStage::AwaitingPaymentProof {
            return Err(self.invalid("record a payment failure"));
        }
        self.fail(CheckoutStage::AwaitingPaymentProof, reason.to_string());
        Ok(())
    }

    /// Abandon the attempt. Nothing is sent and the cart is untouched.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InvalidTransition` once the order is being
    /// submitted or the attempt has ended.
    #[instrument(skip(self), fields(attempt_id = %self.attempt_id))]
    pub fn cancel(&mut self) -> Result<(), CheckoutError> {
        if !self.stage().is_cancellable() {
            return Err(self.invalid("cancel"));
        }
        info!(stage = %self.stage(), "Checkout cancelled");
        self.state = CheckoutState::Cancelled;
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn invalid(&self, action: &'static str) -> CheckoutError {
        CheckoutError::InvalidTransition {
            stage: self.stage(),
            action,
        }
    }

    fn fail(&mut self, during: CheckoutStage, reason: String) {
        warn!(stage = %during, reason = %reason, "Checkout failed");
        self.state = CheckoutState::Failed { during, reason };
    }

    /// The cart must still belong to the user who started the attempt.
    fn ensure_owner<S: ClientStorage>(&self, cart: &CartStore<S>) -> Result<(), CheckoutError> {
        if cart.owner() == self.owner {
            Ok(())
        } else {
            Err(CheckoutError::NotAuthenticated)
        }
    }
}
