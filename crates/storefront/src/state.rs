//! Client state shared by every command.

use crate::api::ApiClient;
use crate::config::StorefrontConfig;
use crate::error::CheckoutError;
use crate::services::{CartStore, Checkout, IdentityResolver};
use crate::storage::{ClientStorage, FileStorage, StorageError};

/// Configuration, backend client and cart store for one client session.
///
/// The backend client is handed out per call with whatever credential is in
/// effect at that moment, so logins and logouts through
/// [`cart_mut`](Self::cart_mut) apply to the next request.
#[derive(Debug)]
pub struct StorefrontContext<S> {
    config: StorefrontConfig,
    api: ApiClient,
    cart: CartStore<S>,
}

impl StorefrontContext<FileStorage> {
    /// Open the file storage under `config.data_dir`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the data directory cannot be created.
    pub fn open(config: StorefrontConfig) -> Result<Self, StorageError> {
        let storage = FileStorage::open(config.data_dir.clone())?;
        Ok(Self::new(config, storage))
    }
}

impl<S: ClientStorage> StorefrontContext<S> {
    /// Create a context over `storage`.
    ///
    /// A token in the configuration takes precedence over the stored one.
    #[must_use]
    pub fn new(config: StorefrontConfig, storage: S) -> Self {
        let mut resolver = IdentityResolver::new();
        if let Some(token) = &config.token {
            resolver = resolver.with_token_override(token.clone());
        }

        Self {
            api: ApiClient::new(&config.api),
            cart: CartStore::with_resolver(storage, resolver),
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    #[must_use]
    pub const fn cart(&self) -> &CartStore<S> {
        &self.cart
    }

    pub const fn cart_mut(&mut self) -> &mut CartStore<S> {
        &mut self.cart
    }

    /// Backend client carrying the current credential, if any.
    #[must_use]
    pub fn api(&self) -> ApiClient {
        match self.cart.resolver().credential(self.cart.storage()) {
            Some(token) => self.api.with_bearer_token(token),
            None => self.api.clone(),
        }
    }

    /// Begin a checkout for the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NotAuthenticated` for guests.
    pub fn checkout(&self) -> Result<Checkout, CheckoutError> {
        Checkout::start(&self.cart, self.config.pricing)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::services::identity::test_token;
    use crate::storage::MemoryStorage;

    fn config(token: Option<&str>) -> StorefrontConfig {
        let mut vars = vec![("SHOPKART_API_URL", "http://localhost:8000".to_string())];
        if let Some(token) = token {
            vars.push(("SHOPKART_TOKEN", token.to_string()));
        }
        StorefrontConfig::from_vars(|key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.clone())
        })
        .unwrap()
    }

    #[test]
    fn test_api_follows_stored_credential() {
        let mut ctx = StorefrontContext::new(config(None), MemoryStorage::new());
        assert!(!ctx.api().is_authenticated());

        ctx.cart_mut()
            .login(&test_token(&json!({"id": 3})))
            .unwrap();
        assert!(ctx.api().is_authenticated());
        assert!(ctx.checkout().is_ok());

        ctx.cart_mut().logout().unwrap();
        assert!(!ctx.api().is_authenticated());
        assert!(matches!(ctx.checkout(), Err(CheckoutError::NotAuthenticated)));
    }

    #[test]
    fn test_configured_token_overrides_storage() {
        let token = test_token(&json!({"id": "cli-user"}));
        let ctx = StorefrontContext::new(config(Some(&token)), MemoryStorage::new());
        assert_eq!(ctx.cart().owner().as_str(), "cli-user");
        assert!(ctx.api().is_authenticated());
    }
}
