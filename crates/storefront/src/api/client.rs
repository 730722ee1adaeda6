//! Backend API client implementation.

use std::sync::Arc;

use reqwest::{RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use shopkart_core::{AddressId, OrderId, Price, ProductId, VariantId};
use tracing::{debug, instrument};
use url::Url;

use super::{ApiError, InventoryApi, OrderApi, PaymentApi};
use crate::config::ApiConfig;
use crate::models::{
    Address, AddressInput, AddressUpdate, Category, Credentials, OrderDraft, OrderHistory,
    OrderRecord, PaymentIntent, PaymentIntentRequest, Product, ProductQuery, Registration,
    TokenResponse, UserProfile, VariantLookupRequest, VariantStock,
};

/// Longest slice of a response body copied into logs and error details.
const BODY_EXCERPT_LEN: usize = 200;

/// Client for the ShopKart backend.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    bearer: Option<SecretString>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("bearer", &self.inner.bearer.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Error body returned by the backend.
#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl ApiClient {
    /// Create an anonymous client.
    #[must_use]
    pub fn new(config: &ApiConfig) -> Self {
        let mut base_url = config.base_url.clone();
        // Relative joins replace the last path segment unless it ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Self {
            inner: Arc::new(ApiClientInner {
                client: reqwest::Client::new(),
                base_url,
                bearer: None,
            }),
        }
    }

    /// A client that authenticates as the holder of `token`.
    ///
    /// Shares the connection pool with `self`.
    #[must_use]
    pub fn with_bearer_token(&self, token: SecretString) -> Self {
        Self {
            inner: Arc::new(ApiClientInner {
                client: self.inner.client.clone(),
                base_url: self.inner.base_url.clone(),
                bearer: Some(token),
            }),
        }
    }

    /// Whether requests carry a credential.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.bearer.is_some()
    }

    /// Resolve an endpoint path against the base URL.
    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Attach the bearer token, failing early if there is none.
    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        let token = self.inner.bearer.as_ref().ok_or(ApiError::Unauthorized)?;
        Ok(request.bearer_auth(token.expose_secret()))
    }

    /// Send a request and map non-success statuses to `ApiError`.
    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = error_detail(&body);

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ApiError::Unauthorized),
            StatusCode::NOT_FOUND => Err(ApiError::NotFound(detail)),
            _ => {
                tracing::error!(
                    status = %status,
                    body = %excerpt(&body),
                    "Backend returned non-success status"
                );
                Err(ApiError::Status {
                    status: status.as_u16(),
                    detail,
                })
            }
        }
    }

    /// Send a request and parse a JSON response body.
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.send(request).await?;

        // Get response body as text first for better error diagnostics
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %excerpt(&text),
                "Failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// All product categories.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        self.send_json(self.inner.client.get(self.endpoint("product/categories")?))
            .await
    }

    /// One page of products matching `query`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, query), fields(search = ?query.search, offset = query.offset))]
    pub async fn products(&self, query: &ProductQuery) -> Result<Vec<Product>, ApiError> {
        let request = self.inner.client.get(self.endpoint("products")?).query(query);
        let products: Vec<Product> = self.send_json(request).await?;
        debug!(count = products.len(), "Fetched products");
        Ok(products)
    }

    /// A product with its variants.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown products, or any request
    /// error.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn product(&self, product_id: &ProductId) -> Result<Product, ApiError> {
        let url = self.endpoint(&format!("products/{product_id}"))?;
        self.send_json(self.inner.client.get(url)).await
    }

    /// Product names matching a partial search term.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn product_suggestions(&self, term: &str, limit: u32) -> Result<Vec<String>, ApiError> {
        let request = self
            .inner
            .client
            .get(self.endpoint("products/suggestion")?)
            .query(&[("naming", term)])
            .query(&[("limit", limit)]);
        self.send_json(request).await
    }

    // =========================================================================
    // Account
    // =========================================================================

    /// Exchange email and password for a credential token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` for wrong credentials, or any request
    /// error.
    #[instrument(skip(self, credentials))]
    pub async fn login(&self, credentials: &Credentials) -> Result<TokenResponse, ApiError> {
        let request = self
            .inner
            .client
            .post(self.endpoint("auth/login")?)
            .json(&credentials.body());
        self.send_json(request).await
    }

    /// Create an account. The new user still has to sign in.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` with the backend's reason (for example an
    /// email already registered), or any request error.
    #[instrument(skip(self, registration))]
    pub async fn register(&self, registration: &Registration) -> Result<UserProfile, ApiError> {
        let request = self
            .inner
            .client
            .post(self.endpoint("auth/register")?)
            .json(&registration.body());
        self.send_json(request).await
    }

    /// The signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` without a valid credential.
    #[instrument(skip(self))]
    pub async fn profile(&self) -> Result<UserProfile, ApiError> {
        let request = self.authorized(self.inner.client.get(self.endpoint("auth/me")?))?;
        self.send_json(request).await
    }

    /// List the signed-in user's saved addresses.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` without a credential, or any request
    /// error.
    #[instrument(skip(self))]
    pub async fn addresses(&self) -> Result<Vec<Address>, ApiError> {
        let request = self.authorized(self.inner.client.get(self.endpoint("account/addresses")?))?;
        let addresses: Vec<Address> = self.send_json(request).await?;
        debug!(count = addresses.len(), "Fetched addresses");
        Ok(addresses)
    }

    /// Save a new shipping address.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` if the address already exists, or any
    /// request error.
    #[instrument(skip(self, address))]
    pub async fn create_address(&self, address: &AddressInput) -> Result<Address, ApiError> {
        let request = self
            .inner
            .client
            .post(self.endpoint("account/addresses")?)
            .json(address);
        self.send_json(self.authorized(request)?).await
    }

    /// Change some fields of a saved address.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown addresses, or any request
    /// error.
    #[instrument(skip(self, update))]
    pub async fn update_address(
        &self,
        address_id: AddressId,
        update: &AddressUpdate,
    ) -> Result<Address, ApiError> {
        let url = self.endpoint(&format!("account/addresses/{address_id}"))?;
        let request = self.inner.client.put(url).json(update);
        // The response echoes the stored fields without the id.
        let fields: AddressUpdate = self.send_json(self.authorized(request)?).await?;
        Ok(Address {
            id: address_id,
            alias: fields.alias,
            address_line1: fields.address_line1,
            city: fields.city,
            state: fields.state,
            zip_code: fields.zip_code,
            phone: None,
        })
    }

    /// Delete a saved address.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown addresses, or any request
    /// error.
    #[instrument(skip(self))]
    pub async fn delete_address(&self, address_id: AddressId) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("account/addresses/{address_id}"))?;
        // The backend reads the id from the query string, not the path.
        let request = self
            .inner
            .client
            .delete(url)
            .query(&[("address_id", address_id)]);
        self.send(self.authorized(request)?).await?;
        Ok(())
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// One page of the signed-in user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` without a credential, or any request
    /// error.
    #[instrument(skip(self))]
    pub async fn order_history(&self, limit: u32, offset: u32) -> Result<OrderHistory, ApiError> {
        let request = self
            .inner
            .client
            .get(self.endpoint("orders")?)
            .query(&[("limit", limit), ("offset", offset)]);
        self.send_json(self.authorized(request)?).await
    }

    /// Download the PDF invoice for an order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown orders, or any request error.
    #[instrument(skip(self))]
    pub async fn invoice(&self, order_id: OrderId) -> Result<Vec<u8>, ApiError> {
        let url = self.endpoint(&format!("orders/{order_id}/invoice"))?;
        let response = self.send(self.authorized(self.inner.client.get(url))?).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

impl InventoryApi for ApiClient {
    #[instrument(skip(self, ids), fields(variant_count = ids.len()))]
    async fn variant_stock(&self, ids: &[VariantId]) -> Result<Vec<VariantStock>, ApiError> {
        let request = self
            .inner
            .client
            .post(self.endpoint("product/variants")?)
            .json(&VariantLookupRequest { ids });
        self.send_json(request).await
    }
}

impl PaymentApi for ApiClient {
    #[instrument(skip(self, amount), fields(amount = %amount))]
    async fn create_payment_intent(&self, amount: &Price) -> Result<PaymentIntent, ApiError> {
        let request = self
            .inner
            .client
            .post(self.endpoint("payment/order")?)
            .json(&PaymentIntentRequest::from(amount));
        self.send_json(self.authorized(request)?).await
    }
}

impl OrderApi for ApiClient {
    #[instrument(skip(self, draft), fields(lines = draft.order_lines.len()))]
    async fn submit_order(&self, draft: &OrderDraft) -> Result<OrderRecord, ApiError> {
        let request = self.inner.client.post(self.endpoint("orders")?).json(draft);
        self.send_json(self.authorized(request)?).await
    }
}

/// Extract `detail` from a backend error body, falling back to the raw text.
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorBody { detail }) => excerpt(&detail.to_string()),
        Err(_) => excerpt(body),
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_LEN).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(&ApiConfig::parse(base).unwrap())
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let api = client("https://shop.test/api");
        assert_eq!(
            api.endpoint("/orders").unwrap().as_str(),
            "https://shop.test/api/orders"
        );
        assert_eq!(
            api.endpoint("orders/7/invoice").unwrap().as_str(),
            "https://shop.test/api/orders/7/invoice"
        );
    }

    #[test]
    fn test_endpoint_at_root() {
        let api = client("http://localhost:8000");
        assert_eq!(
            api.endpoint("product/variants").unwrap().as_str(),
            "http://localhost:8000/product/variants"
        );
    }

    #[test]
    fn test_authorized_requires_token() {
        let api = client("http://localhost:8000");
        let request = api.inner.client.get("http://localhost:8000/orders");
        assert!(matches!(api.authorized(request), Err(ApiError::Unauthorized)));

        let signed_in = api.with_bearer_token(SecretString::from("a.b.c"));
        assert!(signed_in.is_authenticated());
        let request = signed_in.inner.client.get("http://localhost:8000/orders");
        assert!(signed_in.authorized(request).is_ok());
    }

    #[tokio::test]
    async fn test_account_calls_require_token_before_sending() {
        // Unroutable base: reaching the network would fail with Http, not Unauthorized.
        let api = client("http://127.0.0.1:9");
        let address = AddressInput {
            alias: "Home".into(),
            address_line1: "12 MG Road".into(),
            city: "Pune".into(),
            state: "MH".into(),
            zip_code: 411_001,
        };

        assert!(matches!(api.create_address(&address).await, Err(ApiError::Unauthorized)));
        assert!(matches!(
            api.update_address(AddressId::new(4), &AddressUpdate::default()).await,
            Err(ApiError::Unauthorized)
        ));
        assert!(matches!(api.delete_address(AddressId::new(4)).await, Err(ApiError::Unauthorized)));
        assert!(matches!(api.profile().await, Err(ApiError::Unauthorized)));
    }

    #[test]
    fn test_catalog_endpoints() {
        let api = client("https://shop.test/api/");
        assert_eq!(
            api.endpoint(&format!("products/{}", ProductId::new("3"))).unwrap().as_str(),
            "https://shop.test/api/products/3"
        );
        assert_eq!(
            api.endpoint("product/categories").unwrap().as_str(),
            "https://shop.test/api/product/categories"
        );
    }

    #[test]
    fn test_error_detail() {
        assert_eq!(
            error_detail(r#"{"detail": "No variants found for the given IDs"}"#),
            "No variants found for the given IDs"
        );
        assert_eq!(error_detail("Bad Gateway"), "Bad Gateway");
        assert!(error_detail(r#"{"detail": [{"loc": ["body"], "msg": "field required"}]}"#)
            .contains("field required"));
    }

    #[test]
    fn test_debug_redacts_token() {
        let api = client("http://localhost:8000").with_bearer_token(SecretString::from("secret.jwt.value"));
        let debug = format!("{api:?}");
        assert!(!debug.contains("secret.jwt.value"));
    }

    #[test]
    fn test_api_client_is_clone_send_sync() {
        fn assert_clone_send_sync<T: Clone + Send + Sync>() {}
        assert_clone_send_sync::<ApiClient>();
    }
}
