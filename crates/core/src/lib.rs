//! ShopKart Core - Shared domain types.
//!
//! This crate provides the types shared by every ShopKart client component:
//! - `storefront` - Cart store, stock validation and checkout handoff
//! - `cli` - Command-line driver for the storefront client
//!
//! # Architecture
//!
//! The core crate contains only types and pure in-memory rules - no I/O, no
//! storage access, no HTTP clients. This keeps it lightweight and allows it to
//! be used anywhere, including inside a browser runtime.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, prices, owner keys, cart lines and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
