//! ShopKart storefront client core.
//!
//! Keeps the shopper's cart in client storage across sign-in and sign-out,
//! validates it against backend inventory, and hands it off to the payment
//! gateway and order API.
//!
//! # Modules
//!
//! - [`storage`] - Durable key/value client storage
//! - [`services`] - Identity, cart store, stock validation, pricing and checkout
//! - [`api`] - Backend REST client (catalog, account, inventory, payment, orders)
//! - [`models`] - Wire, form and session types
//! - [`config`] - Environment configuration
//! - [`error`] - Checkout error taxonomy and Sentry helpers
//! - [`state`] - Per-session context bundling the above

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
