//! Live-backend integration tests for ShopKart.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the backend, then
//! SHOPKART_API_URL=http://localhost:8000 \
//! SHOPKART_TEST_TOKEN=eyJhbGciOi... \
//! SHOPKART_TEST_VARIANT_ID=7 \
//! SHOPKART_TEST_ADDRESS_ID=5 \
//!     cargo test -p shopkart-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `inventory` - Batched stock lookup and validation
//! - `account` - Addresses and order history
//! - `checkout` - Payment intent creation against the gateway

use secrecy::SecretString;
use shopkart_storefront::config::{ApiConfig, StorefrontConfig};
use shopkart_storefront::state::StorefrontContext;
use shopkart_storefront::storage::MemoryStorage;

/// Base URL for the backend API (configurable via environment).
#[must_use]
pub fn api_base_url() -> String {
    std::env::var("SHOPKART_API_URL").unwrap_or_else(|_| "http://localhost:8000".to_string())
}

/// Credential for a test account, if one is configured.
#[must_use]
pub fn test_token() -> Option<String> {
    std::env::var("SHOPKART_TEST_TOKEN")
        .ok()
        .filter(|t| !t.is_empty())
}

/// A variant known to be in stock on the test backend.
#[must_use]
pub fn test_variant_id() -> Option<String> {
    std::env::var("SHOPKART_TEST_VARIANT_ID").ok()
}

/// A saved address belonging to the test account.
#[must_use]
pub fn test_address_id() -> Option<i64> {
    std::env::var("SHOPKART_TEST_ADDRESS_ID")
        .ok()
        .and_then(|id| id.parse().ok())
}

/// Backend API configuration for the test backend.
///
/// # Panics
///
/// Panics if `SHOPKART_API_URL` is not a valid http(s) URL.
#[must_use]
pub fn api_config() -> ApiConfig {
    ApiConfig::parse(&api_base_url()).expect("SHOPKART_API_URL must be an http(s) URL")
}

/// A client context over in-memory storage, signed in with `token` if given.
///
/// # Panics
///
/// Panics if the environment configuration is invalid.
#[must_use]
pub fn context(token: Option<&str>) -> StorefrontContext<MemoryStorage> {
    let url = api_base_url();
    let mut config = StorefrontConfig::from_vars(|key| match key {
        "SHOPKART_API_URL" => Some(url.clone()),
        _ => None,
    })
    .expect("test configuration must be valid");
    config.token = token.map(|t| SecretString::from(t.to_string()));

    StorefrontContext::new(config, MemoryStorage::new())
}
