//! Storefront client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `SHOPKART_API_URL` - Backend base URL (default: `http://localhost:8000`)
//! - `SHOPKART_DATA_DIR` - Directory for client storage (default: `.shopkart`)
//! - `SHOPKART_CURRENCY` - ISO 4217 currency for payments (default: INR)
//! - `SHOPKART_PLATFORM_FEE` - Flat platform fee added to every order (default: 20)
//! - `SHOPKART_TOKEN` - Credential token to use instead of the stored one
//! - `SHOPKART_GATEWAY_KEY_ID` - Public key id handed to the payment gateway UI
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Sentry error sample rate, 0.0 to 1.0 (default: 1.0)

use std::path::PathBuf;

use rust_decimal::Decimal;
use secrecy::SecretString;
use shopkart_core::CurrencyCode;
use thiserror::Error;
use url::Url;

use crate::services::pricing::Pricing;

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_DATA_DIR: &str = ".shopkart";
const DEFAULT_PLATFORM_FEE: &str = "20";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Clone)]
pub struct StorefrontConfig {
    /// Backend API configuration
    pub api: ApiConfig,
    /// Directory backing the client storage
    pub data_dir: PathBuf,
    /// Currency and flat fees applied at checkout
    pub pricing: Pricing,
    /// Credential override (takes precedence over the stored token)
    pub token: Option<SecretString>,
    /// Public key id for the payment gateway UI
    pub gateway_key_id: Option<String>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
}

impl std::fmt::Debug for StorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontConfig")
            .field("api", &self.api)
            .field("data_dir", &self.data_dir)
            .field("pricing", &self.pricing)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("gateway_key_id", &self.gateway_key_id)
            .field("sentry_dsn", &self.sentry_dsn)
            .field("sentry_environment", &self.sentry_environment)
            .field("sentry_sample_rate", &self.sentry_sample_rate)
            .finish()
    }
}

/// Backend API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL every endpoint path is resolved against
    pub base_url: Url,
}

impl ApiConfig {
    /// Parse a base URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL is not absolute http(s).
    pub fn parse(base_url: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidEnvVar("SHOPKART_API_URL".to_string(), reason);

        let base_url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {}", base_url.scheme())));
        }
        Ok(Self { base_url })
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get_or_default =
            |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let api = ApiConfig::parse(&get_or_default("SHOPKART_API_URL", DEFAULT_API_URL))?;
        let data_dir = PathBuf::from(get_or_default("SHOPKART_DATA_DIR", DEFAULT_DATA_DIR));

        let currency = get_or_default("SHOPKART_CURRENCY", CurrencyCode::default().code())
            .parse::<CurrencyCode>()
            .map_err(|e| ConfigError::InvalidEnvVar("SHOPKART_CURRENCY".to_string(), e.to_string()))?;
        let platform_fee = parse_fee(&get_or_default("SHOPKART_PLATFORM_FEE", DEFAULT_PLATFORM_FEE))?;

        let sentry_sample_rate = match lookup("SENTRY_SAMPLE_RATE") {
            Some(raw) => parse_sample_rate(&raw)?,
            None => 1.0,
        };

        Ok(Self {
            api,
            data_dir,
            pricing: Pricing::new(platform_fee, currency),
            token: lookup("SHOPKART_TOKEN")
                .filter(|t| !t.trim().is_empty())
                .map(SecretString::from),
            gateway_key_id: lookup("SHOPKART_GATEWAY_KEY_ID"),
            sentry_dsn: lookup("SENTRY_DSN"),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
            sentry_sample_rate,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a non-negative decimal fee.
fn parse_fee(raw: &str) -> Result<Decimal, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar("SHOPKART_PLATFORM_FEE".to_string(), reason);

    let fee = raw
        .trim()
        .parse::<Decimal>()
        .map_err(|e| invalid(e.to_string()))?;
    if fee.is_sign_negative() {
        return Err(invalid("must not be negative".to_string()));
    }
    Ok(fee)
}

/// Parse a sample rate between 0.0 and 1.0.
fn parse_sample_rate(raw: &str) -> Result<f32, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar("SENTRY_SAMPLE_RATE".to_string(), reason);

    let rate = raw.trim().parse::<f32>().map_err(|e| invalid(e.to_string()))?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(invalid(format!("{rate} is outside 0.0..=1.0")));
    }
    Ok(rate)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.api.base_url.as_str(), "http://localhost:8000/");
        assert_eq!(config.data_dir, PathBuf::from(".shopkart"));
        assert_eq!(config.pricing.platform_fee, Decimal::from(20));
        assert_eq!(config.pricing.currency, CurrencyCode::INR);
        assert!(config.token.is_none());
        assert!((config.sentry_sample_rate - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("SHOPKART_API_URL", "https://api.shopkart.test/v1"),
            ("SHOPKART_CURRENCY", "usd"),
            ("SHOPKART_PLATFORM_FEE", "2.50"),
            ("SHOPKART_TOKEN", "header.payload.sig"),
        ])
        .unwrap();
        assert_eq!(config.api.base_url.host_str(), Some("api.shopkart.test"));
        assert_eq!(config.pricing.currency, CurrencyCode::USD);
        assert_eq!(config.pricing.platform_fee, Decimal::new(250, 2));
        assert_eq!(
            config.token.as_ref().map(|t| t.expose_secret().to_string()),
            Some("header.payload.sig".to_string())
        );
    }

    #[test]
    fn test_negative_fee_rejected() {
        let err = config_from(&[("SHOPKART_PLATFORM_FEE", "-1")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "SHOPKART_PLATFORM_FEE"));
    }

    #[test]
    fn test_bad_url_rejected() {
        assert!(config_from(&[("SHOPKART_API_URL", "not a url")]).is_err());
        assert!(config_from(&[("SHOPKART_API_URL", "ftp://files.example")]).is_err());
    }

    #[test]
    fn test_sample_rate_bounds() {
        assert!(config_from(&[("SENTRY_SAMPLE_RATE", "1.5")]).is_err());
        let config = config_from(&[("SENTRY_SAMPLE_RATE", "0.25")]).unwrap();
        assert!((config.sentry_sample_rate - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = config_from(&[("SHOPKART_TOKEN", "very.private.token")]).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("very.private.token"));
        assert!(debug.contains("[REDACTED]"));
    }
}
