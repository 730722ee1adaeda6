//! Core types for ShopKart.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod id;
pub mod owner;
pub mod price;
pub mod status;

pub use cart::{Cart, CartLine, CartLineInput};
pub use id::*;
pub use owner::OwnerKey;
pub use price::{CurrencyCode, CurrencyError, Price};
pub use status::*;
