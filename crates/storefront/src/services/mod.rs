//! Client core services.
//!
//! # Services
//!
//! - `identity` - Cart owner resolution from the stored credential
//! - `cart` - Per-owner cart persistence with merge-on-login
//! - `stock` - Batched stock validation before payment
//! - `pricing` - Order totals with flat fees
//! - `checkout` - Address, payment intent and order submission state machine

pub mod cart;
pub mod checkout;
pub mod identity;
pub mod pricing;
pub mod stock;

#[cfg(test)]
pub(crate) mod testing;

pub use cart::CartStore;
pub use checkout::{Checkout, CheckoutStage, CheckoutState};
pub use identity::{Clock, IdentityError, IdentityResolver, Resolution};
pub use pricing::{OrderSummary, Pricing};
pub use stock::{OutOfStock, PriceChange, StockReport, StockValidator};
