//! Authenticated API client implementation.
//!
//! One `reqwest::Client` behind an `Arc`, cheap to clone. Requests to
//! non-public endpoints carry `Authorization: Bearer <access_token>`
//! read from the credential store at call time. A 401 carrying the
//! expired-token signature triggers the single-flight refresh protocol
//! (see [`crate::refresh`]); the failing request replays exactly once
//! with the new token. Catalog reads are cached with `moka`
//! (5-minute TTL).

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use moka::future::Cache;
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use blood_orange_core::{ApiEnvelope, TokenPair, VariantId, WishlistData};

use crate::cache::CachedCatalog;
use crate::config::ClientConfig;
use crate::credentials::CredentialStore;
use crate::endpoints::Endpoint;
use crate::error::{ApiError, RefreshError};
use crate::refresh::{RefreshCoordinator, RefreshTicket};
use crate::types::{Customer, Order, OrderList, Product, ProductPage};

/// The exact failure body the backend sends for an expired access
/// token. This signature, and only this signature, triggers the refresh
/// protocol; every other 401/403 propagates as a normal failure.
pub const TOKEN_EXPIRED_ERROR: &str = "Access token has expired. Please login.";

/// Effect fired once per failed refresh so the application shell can
/// drop to its unauthenticated state. The client itself never
/// navigates; every affected caller also receives
/// [`ApiError::SessionExpired`].
pub type SessionInvalidatedHook = Box<dyn Fn() + Send + Sync>;

/// Client for the storefront backend API.
///
/// Cheap to clone; all clones share the credential store, the refresh
/// coordinator, and the catalog cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialStore>,
    refresh: RefreshCoordinator,
    catalog_cache: Cache<String, CachedCatalog>,
    on_session_invalidated: OnceLock<SessionInvalidatedHook>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(
        config: &ClientConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        let catalog_cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.api_base_url.clone(),
                credentials,
                refresh: RefreshCoordinator::new(),
                catalog_cache,
                on_session_invalidated: OnceLock::new(),
            }),
        })
    }

    /// Register the session-invalidated effect. At most one hook can be
    /// registered for the lifetime of the client; later calls are
    /// ignored with a warning.
    pub fn on_session_invalidated(&self, hook: impl Fn() + Send + Sync + 'static) {
        if self
            .inner
            .on_session_invalidated
            .set(Box::new(hook))
            .is_err()
        {
            warn!("session-invalidated hook already registered; ignoring");
        }
    }

    /// The credential store this client reads from.
    #[must_use]
    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.inner.credentials
    }

    fn endpoint_url(&self, endpoint: &Endpoint) -> String {
        format!("{}/{}", self.inner.base_url, endpoint.relative_url())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Request path
    // ─────────────────────────────────────────────────────────────────────

    /// Issue a request against a known endpoint.
    ///
    /// Bearer authorization is attached for non-public endpoints, read
    /// fresh from the credential store on every attempt. The caller's
    /// body is serialized per attempt and never mutated. On a 401 with
    /// the expired-token signature the request joins the single-flight
    /// refresh and replays exactly once.
    ///
    /// # Errors
    ///
    /// See [`ApiError`]; network failures are not retried here.
    #[instrument(skip(self, body), fields(path = %endpoint.relative_url()))]
    pub async fn send(
        &self,
        method: Method,
        endpoint: &Endpoint,
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Response, ApiError> {
        let mut retried = false;

        loop {
            let request_id = Uuid::new_v4();
            let mut request = self
                .inner
                .http
                .request(method.clone(), self.endpoint_url(endpoint))
                .header("X-Request-Id", request_id.to_string());

            if !endpoint.is_public()
                && let Some(pair) = self.inner.credentials.read()
            {
                request = request.bearer_auth(pair.access_token.expose_secret());
            }

            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(1);
                return Err(ApiError::RateLimited(retry_after));
            }

            if status == StatusCode::UNAUTHORIZED {
                let text = response.text().await?;

                // The refresh endpoint itself never triggers a refresh,
                // and a request that already replayed once propagates
                // its failure instead of looping.
                if !retried
                    && *endpoint != Endpoint::TokenRefresh
                    && is_expired_token_body(&text)
                {
                    debug!(request_id = %request_id, "access token expired; joining refresh");
                    retried = true;
                    self.refresh_access_token().await?;
                    continue;
                }

                return Err(ApiError::Unauthorized(failure_message(&text)));
            }

            if status == StatusCode::FORBIDDEN {
                let text = response.text().await?;
                return Err(ApiError::Forbidden(failure_message(&text)));
            }

            return Ok(response);
        }
    }

    /// Decode a response into the envelope's `data` payload.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let text = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(failure_message(&text)));
        }

        // A body that is not the promised JSON is a hard error, never
        // silently coerced.
        let envelope: ApiEnvelope<T> = serde_json::from_str(&text)?;

        if let Some(errors) = envelope.errors
            && !errors.is_empty()
        {
            return Err(ApiError::Validation(errors));
        }

        if !status.is_success() || !envelope.success {
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: envelope
                    .error
                    .or(envelope.message)
                    .unwrap_or_else(|| "request failed".to_owned()),
            });
        }

        envelope.data.ok_or_else(|| ApiError::Api {
            status: status.as_u16(),
            message: "response envelope carried no data".to_owned(),
        })
    }

    /// Decode a mutation acknowledgement, where `data` may be absent.
    async fn decode_ack(response: reqwest::Response) -> Result<(), ApiError> {
        let status = response.status();
        let text = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(failure_message(&text)));
        }

        let envelope: ApiEnvelope<serde_json::Value> = serde_json::from_str(&text)?;

        if let Some(ref errors) = envelope.errors
            && !errors.is_empty()
        {
            return Err(ApiError::Validation(errors.clone()));
        }

        if !status.is_success() || !envelope.success {
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: envelope.failure_message(),
            });
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Token refresh
    // ─────────────────────────────────────────────────────────────────────

    /// Obtain a fresh access token, coalescing concurrent callers into
    /// one refresh call.
    async fn refresh_access_token(&self) -> Result<String, RefreshError> {
        match self.inner.refresh.join() {
            RefreshTicket::Waiter(rx) => rx
                .await
                .unwrap_or_else(|_| Err(RefreshError::Http("refresh round abandoned".to_owned()))),
            RefreshTicket::Leader => {
                let outcome = self.perform_refresh().await;
                self.inner.refresh.complete(&outcome);

                if outcome.is_err()
                    && let Some(hook) = self.inner.on_session_invalidated.get()
                {
                    hook();
                }

                outcome
            }
        }
    }

    /// The actual refresh exchange. Only ever executed by the round
    /// leader.
    async fn perform_refresh(&self) -> Result<String, RefreshError> {
        // Fail closed: no stored pair means no refresh token, so there
        // is nothing to exchange and no network call to make.
        let Some(pair) = self.inner.credentials.read() else {
            return Err(RefreshError::MissingRefreshToken);
        };

        let body = serde_json::json!({
            "refresh_token": pair.refresh_token.expose_secret(),
        });

        let response = self
            .inner
            .http
            .post(self.endpoint_url(&Endpoint::TokenRefresh))
            .header("X-Request-Id", Uuid::new_v4().to_string())
            .json(&body)
            .send()
            .await
            .map_err(|e| RefreshError::Http(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RefreshError::Http(e.to_string()))?;

        if !status.is_success() {
            warn!(status = %status, "refresh token rejected");
            return Err(RefreshError::Rejected {
                status: status.as_u16(),
                message: failure_message(&text),
            });
        }

        let refreshed: TokenPair = serde_json::from_str(&text)
            .map_err(|e| RefreshError::MalformedResponse(e.to_string()))?;
        let refreshed = refreshed
            .validated()
            .map_err(|e| RefreshError::MalformedResponse(e.to_string()))?;

        let access_token = refreshed.access_token.expose_secret().to_owned();

        // The pair is replaced as a unit; a read anywhere after this
        // line observes the new tokens.
        self.inner
            .credentials
            .write(refreshed)
            .map_err(|e| RefreshError::CredentialStore(e.to_string()))?;

        debug!("access token refreshed");
        Ok(access_token)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Auth Operations
    // ─────────────────────────────────────────────────────────────────────

    /// Log in with email and password, storing the returned token pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the credentials are
    /// rejected.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<(), ApiError> {
        let body = serde_json::json!({ "email": email, "password": password });
        let response = self.send(Method::POST, &Endpoint::Login, Some(&body)).await?;

        let pair: TokenPair = Self::decode(response).await?;
        let pair = pair
            .validated()
            .map_err(|e| ApiError::Api {
                status: 200,
                message: format!("login response was missing a token: {e}"),
            })?;

        self.inner.credentials.write(pair)?;
        Ok(())
    }

    /// Drop the stored credential pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential store cannot be cleared.
    pub fn logout(&self) -> Result<(), ApiError> {
        self.inner.credentials.clear()?;
        Ok(())
    }

    /// Register a new account. The backend sends a verification email;
    /// the session is not authenticated until [`Self::login`].
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; field problems surface as
    /// [`ApiError::Validation`].
    #[instrument(skip(self, password))]
    pub async fn register(&self, email: &str, password: &str) -> Result<(), ApiError> {
        let body = serde_json::json!({ "email": email, "password": password });
        let response = self
            .send(Method::POST, &Endpoint::Register, Some(&body))
            .await?;
        Self::decode_ack(response).await
    }

    /// Redeem an email-verification token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is rejected or the request fails.
    pub async fn verify_email(&self, token: &str) -> Result<(), ApiError> {
        let endpoint = Endpoint::EmailVerification {
            token: token.to_owned(),
        };
        let response = self.send(Method::GET, &endpoint, None).await?;
        Self::decode_ack(response).await
    }

    /// Fetch the authenticated customer's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn profile(&self) -> Result<Customer, ApiError> {
        let response = self.send(Method::GET, &Endpoint::Profile, None).await?;
        Self::decode(response).await
    }

    /// Fetch the authenticated customer's order history, newest first
    /// (server ordering is passed through).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn orders(&self) -> Result<Vec<Order>, ApiError> {
        let response = self.send(Method::GET, &Endpoint::Orders, None).await?;
        let list: OrderList = Self::decode(response).await?;
        Ok(list.items)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Wishlist Operations
    // ─────────────────────────────────────────────────────────────────────

    /// Fetch the server's wishlist membership, in server order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn fetch_wishlist(&self) -> Result<Vec<VariantId>, ApiError> {
        let response = self.send(Method::GET, &Endpoint::Wishlist, None).await?;
        let data: WishlistData = Self::decode(response).await?;
        Ok(data.variant_ids())
    }

    /// Add a variant to the server-side wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn add_wishlist_item(&self, variant_id: &VariantId) -> Result<(), ApiError> {
        let endpoint = Endpoint::WishlistItem {
            variant_id: variant_id.clone(),
        };
        let response = self.send(Method::POST, &endpoint, None).await?;
        Self::decode_ack(response).await
    }

    /// Remove a variant from the server-side wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn remove_wishlist_item(&self, variant_id: &VariantId) -> Result<(), ApiError> {
        let endpoint = Endpoint::WishlistItem {
            variant_id: variant_id.clone(),
        };
        let response = self.send(Method::DELETE, &endpoint, None).await?;
        Self::decode_ack(response).await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Catalog Operations
    // ─────────────────────────────────────────────────────────────────────

    /// Get a product by its handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the request
    /// fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_product(&self, handle: &str) -> Result<Product, ApiError> {
        let endpoint = Endpoint::Product {
            handle: handle.to_owned(),
        };
        let cache_key = endpoint
            .cache_key()
            .unwrap_or_else(|| endpoint.relative_url());

        if let Some(CachedCatalog::Product(product)) =
            self.inner.catalog_cache.get(&cache_key).await
        {
            debug!("cache hit for product");
            return Ok(*product);
        }

        let response = self.send(Method::GET, &endpoint, None).await?;
        let product: Product = Self::decode(response).await?;

        self.inner
            .catalog_cache
            .insert(cache_key, CachedCatalog::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// List a page of the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, cursor: Option<&str>) -> Result<ProductPage, ApiError> {
        let endpoint = Endpoint::Products {
            cursor: cursor.map(str::to_owned),
        };
        let cache_key = endpoint
            .cache_key()
            .unwrap_or_else(|| endpoint.relative_url());

        if let Some(CachedCatalog::Products(page)) =
            self.inner.catalog_cache.get(&cache_key).await
        {
            debug!("cache hit for product page");
            return Ok(page);
        }

        let response = self.send(Method::GET, &endpoint, None).await?;
        let page: ProductPage = Self::decode(response).await?;

        self.inner
            .catalog_cache
            .insert(cache_key, CachedCatalog::Products(page.clone()))
            .await;

        Ok(page)
    }
}

/// Does a 401 body carry the expired-access-token signature?
fn is_expired_token_body(text: &str) -> bool {
    serde_json::from_str::<ApiEnvelope<serde_json::Value>>(text)
        .is_ok_and(|envelope| envelope.error.as_deref() == Some(TOKEN_EXPIRED_ERROR))
}

/// Best failure description from a (possibly non-JSON) error body.
fn failure_message(text: &str) -> String {
    serde_json::from_str::<ApiEnvelope<serde_json::Value>>(text).map_or_else(
        |_| text.chars().take(200).collect(),
        |envelope| envelope.failure_message(),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use httpmock::MockServer;
    use httpmock::prelude::*;

    use crate::credentials::MemoryCredentialStore;

    fn client_with(server: &MockServer, pair: Option<TokenPair>) -> ApiClient {
        let config = ClientConfig::new(server.base_url()).unwrap();
        let credentials = match pair {
            Some(pair) => MemoryCredentialStore::with_pair(pair),
            None => MemoryCredentialStore::new(),
        };
        ApiClient::new(&config, Arc::new(credentials)).unwrap()
    }

    fn pair(access: &str, refresh: &str) -> TokenPair {
        TokenPair::new(access, refresh).unwrap()
    }

    fn expired_body() -> serde_json::Value {
        serde_json::json!({ "success": false, "error": TOKEN_EXPIRED_ERROR })
    }

    #[tokio::test]
    async fn test_bearer_attached_to_authenticated_endpoint() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/wishlist/")
                    .header("authorization", "Bearer a1");
                then.status(200)
                    .json_body(serde_json::json!({ "success": true, "data": { "items": [] } }));
            })
            .await;

        let client = client_with(&server, Some(pair("a1", "r1")));
        let wishlist = client.fetch_wishlist().await.unwrap();

        assert!(wishlist.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_public_endpoint_sends_no_bearer() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/products/citrus-tee/")
                    .header_missing("authorization");
                then.status(200).json_body(serde_json::json!({
                    "success": true,
                    "data": {
                        "id": "p1",
                        "handle": "citrus-tee",
                        "title": "Citrus Tee",
                        "price": "12.00",
                        "variants": []
                    }
                }));
            })
            .await;

        let client = client_with(&server, Some(pair("a1", "r1")));
        let product = client.get_product("citrus-tee").await.unwrap();

        assert_eq!(product.title, "Citrus Tee");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_catalog_cache_serves_second_read() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/products/citrus-tee/");
                then.status(200).json_body(serde_json::json!({
                    "success": true,
                    "data": {
                        "id": "p1",
                        "handle": "citrus-tee",
                        "title": "Citrus Tee",
                        "price": "12.00",
                        "variants": []
                    }
                }));
            })
            .await;

        let client = client_with(&server, None);
        client.get_product("citrus-tee").await.unwrap();
        client.get_product("citrus-tee").await.unwrap();

        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_expired_token_refreshes_and_replays_once() {
        let server = MockServer::start_async().await;

        let stale = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/wishlist/")
                    .header("authorization", "Bearer stale");
                then.status(401).json_body(expired_body());
            })
            .await;

        let refresh = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/auth/token/refresh/")
                    .json_body(serde_json::json!({ "refresh_token": "r1" }));
                then.status(200).json_body(serde_json::json!({
                    "access_token": "fresh",
                    "refresh_token": "r2"
                }));
            })
            .await;

        let replay = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/wishlist/")
                    .header("authorization", "Bearer fresh");
                then.status(200).json_body(serde_json::json!({
                    "success": true,
                    "data": { "items": [ { "default_variant": { "id": "v9" } } ] }
                }));
            })
            .await;

        let client = client_with(&server, Some(pair("stale", "r1")));
        let wishlist = client.fetch_wishlist().await.unwrap();

        assert_eq!(wishlist, vec![VariantId::new("v9")]);
        stale.assert_async().await;
        refresh.assert_async().await;
        replay.assert_async().await;

        // The rotated pair was stored as a unit
        let stored = client.credentials().read().unwrap();
        assert_eq!(stored.access_token.expose_secret(), "fresh");
        assert_eq!(stored.refresh_token.expose_secret(), "r2");
    }

    #[tokio::test]
    async fn test_generic_401_is_not_refreshed() {
        let server = MockServer::start_async().await;

        let denied = server
            .mock_async(|when, then| {
                when.method(GET).path("/wishlist/");
                then.status(401)
                    .json_body(serde_json::json!({ "success": false, "error": "Invalid token." }));
            })
            .await;

        let refresh = server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/token/refresh/");
                then.status(200).json_body(serde_json::json!({
                    "access_token": "fresh",
                    "refresh_token": "r2"
                }));
            })
            .await;

        let client = client_with(&server, Some(pair("a1", "r1")));
        let err = client.fetch_wishlist().await.unwrap_err();

        assert!(matches!(err, ApiError::Unauthorized(message) if message == "Invalid token."));
        denied.assert_async().await;
        refresh.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_refresh_fails_closed_without_refresh_token() {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(GET).path("/wishlist/");
                then.status(401).json_body(expired_body());
            })
            .await;

        let refresh = server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/token/refresh/");
                then.status(200);
            })
            .await;

        // No stored credentials at all: the 401 still arrives (no bearer
        // was attached), but the refresh must not touch the network.
        let client = client_with(&server, None);
        let err = client.fetch_wishlist().await.unwrap_err();

        assert!(matches!(
            err,
            ApiError::SessionExpired(RefreshError::MissingRefreshToken)
        ));
        refresh.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_refresh_failure_fires_hook_once_and_surfaces_typed_error() {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(GET).path("/wishlist/");
                then.status(401).json_body(expired_body());
            })
            .await;

        let refresh = server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/token/refresh/");
                then.status(401).json_body(
                    serde_json::json!({ "success": false, "error": "Refresh token expired." }),
                );
            })
            .await;

        let client = client_with(&server, Some(pair("stale", "r1")));

        let invalidations = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&invalidations);
        client.on_session_invalidated(move || {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        });

        let err = client.fetch_wishlist().await.unwrap_err();

        assert!(matches!(
            err,
            ApiError::SessionExpired(RefreshError::Rejected { status: 401, .. })
        ));
        assert_eq!(invalidations.load(std::sync::atomic::Ordering::SeqCst), 1);
        refresh.assert_async().await;
    }

    #[tokio::test]
    async fn test_refresh_response_missing_token_is_malformed() {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(GET).path("/wishlist/");
                then.status(401).json_body(expired_body());
            })
            .await;

        server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/token/refresh/");
                then.status(200)
                    .json_body(serde_json::json!({ "access_token": "fresh" }));
            })
            .await;

        let client = client_with(&server, Some(pair("stale", "r1")));
        let err = client.fetch_wishlist().await.unwrap_err();

        assert!(matches!(
            err,
            ApiError::SessionExpired(RefreshError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_rate_limit_surfaces_retry_after() {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(GET).path("/products/");
                then.status(429).header("Retry-After", "7");
            })
            .await;

        let client = client_with(&server, None);
        let err = client.list_products(None).await.unwrap_err();

        assert!(matches!(err, ApiError::RateLimited(7)));
    }

    #[tokio::test]
    async fn test_validation_envelope_maps_to_field_errors() {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/login/");
                then.status(400).json_body(serde_json::json!({
                    "success": false,
                    "message": "Validation failed",
                    "errors": { "email": ["is invalid"] }
                }));
            })
            .await;

        let client = client_with(&server, None);
        let err = client.login("nope", "pw").await.unwrap_err();

        match err {
            ApiError::Validation(errors) => {
                assert_eq!(errors.get("email").unwrap(), &vec!["is invalid".to_owned()]);
            }
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_login_stores_pair_and_logout_clears_it() {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/login/").json_body(
                    serde_json::json!({ "email": "ada@example.com", "password": "pw" }),
                );
                then.status(200).json_body(serde_json::json!({
                    "success": true,
                    "data": { "access_token": "a1", "refresh_token": "r1" }
                }));
            })
            .await;

        let client = client_with(&server, None);
        client.login("ada@example.com", "pw").await.unwrap();

        let stored = client.credentials().read().unwrap();
        assert_eq!(stored.access_token.expose_secret(), "a1");

        client.logout().unwrap();
        assert!(client.credentials().read().is_none());
    }

    #[tokio::test]
    async fn test_orders_decodes_history() {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/account/orders/")
                    .header("authorization", "Bearer a1");
                then.status(200).json_body(serde_json::json!({
                    "success": true,
                    "data": { "items": [
                        { "id": "o1", "number": "#1001", "placed_at": "2026-08-01T12:00:00Z",
                          "status": "fulfilled", "total": "42.00" }
                    ] }
                }));
            })
            .await;

        let client = client_with(&server, Some(pair("a1", "r1")));
        let orders = client.orders().await.unwrap();

        assert_eq!(orders.len(), 1);
        assert_eq!(orders.first().unwrap().number, "#1001");
    }

    #[tokio::test]
    async fn test_verify_email_token_path_is_sent_verbatim() {
        let server = MockServer::start_async().await;

        // No trailing slash: the token segment is matched verbatim.
        let verify = server
            .mock_async(|when, then| {
                when.method(GET).path("/auth/verify-email/tok_123");
                then.status(200)
                    .json_body(serde_json::json!({ "success": true, "message": "verified" }));
            })
            .await;

        let client = client_with(&server, None);
        client.verify_email("tok_123").await.unwrap();
        verify.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_json_body_is_a_parse_error() {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(GET).path("/wishlist/");
                then.status(200).body("<html>definitely not json</html>");
            })
            .await;

        let client = client_with(&server, Some(pair("a1", "r1")));
        let err = client.fetch_wishlist().await.unwrap_err();

        assert!(matches!(err, ApiError::Parse(_)));
    }
}
