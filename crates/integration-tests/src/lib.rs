//! Integration tests for the RocketShoes cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rocketshoes-integration-tests
//! ```
//!
//! No external services are needed: each test serves a [`FakeStoreApi`] on an
//! ephemeral local port and points the real HTTP client at it, with the cart
//! persisted to a temporary directory.
//!
//! # Example
//!
//! ```rust,ignore
//! #[tokio::test]
//! async fn test_add_over_http() {
//!     let api = FakeStoreApi::new().with_product(sneaker(1), 5);
//!     let ctx = TestContext::start(&api).await;
//!     let mut session = ctx.open_session();
//!
//!     session.store.add_product(ProductId::new(1)).await;
//!     assert_eq!(session.store.cart().len(), 1);
//! }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use rocketshoes_cart::{
    ApiClient, CartConfig, CartStore, ChannelNotifier, FileStorage, Notification, Product,
    ProductId,
};
use rust_decimal::Decimal;
use secrecy::SecretString;
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use url::Url;

// =============================================================================
// Fake store API
// =============================================================================

/// In-process stand-in for the store API.
///
/// Serves `GET /stock/{id}` and `GET /products/{id}` and counts hits so tests
/// can assert on caching.
#[derive(Clone, Default)]
pub struct FakeStoreApi {
    inner: Arc<FakeStoreInner>,
}

#[derive(Default)]
struct FakeStoreInner {
    stock: Mutex<HashMap<i32, i64>>,
    products: Mutex<HashMap<i32, Product>>,
    stock_failure: Mutex<Option<StatusCode>>,
    required_token: Mutex<Option<String>>,
    amount_only: AtomicBool,
    stock_hits: AtomicUsize,
    product_hits: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FakeStoreApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a product with its available stock.
    #[must_use]
    pub fn with_product(self, product: Product, stock: i64) -> Self {
        let id = product.id.as_i32();
        lock(&self.inner.products).insert(id, product);
        lock(&self.inner.stock).insert(id, stock);
        self
    }

    /// Reject requests that don't carry this bearer token.
    #[must_use]
    pub fn requiring_token(self, token: &str) -> Self {
        *lock(&self.inner.required_token) = Some(token.to_string());
        self
    }

    /// Answer stock requests with `{"amount": n}` and no `id`.
    #[must_use]
    pub fn with_amount_only_stock(self) -> Self {
        self.inner.amount_only.store(true, Ordering::SeqCst);
        self
    }

    pub fn set_stock(&self, product_id: i32, amount: i64) {
        lock(&self.inner.stock).insert(product_id, amount);
    }

    /// Make every stock request answer with `status`; `None` restores service.
    pub fn fail_stock_with(&self, status: Option<StatusCode>) {
        *lock(&self.inner.stock_failure) = status;
    }

    #[must_use]
    pub fn stock_hits(&self) -> usize {
        self.inner.stock_hits.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn product_hits(&self) -> usize {
        self.inner.product_hits.load(Ordering::SeqCst)
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/stock/{id}", get(get_stock))
            .route("/products/{id}", get(get_product))
            .with_state(self.clone())
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let required = lock(&self.inner.required_token);
        let Some(token) = required.as_deref() else {
            return true;
        };

        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|presented| presented == token)
    }

    /// Serve on an ephemeral local port until the handle is dropped.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    #[allow(clippy::expect_used)]
    pub async fn serve(&self) -> RunningApi {
        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .expect("Failed to bind fake store API");
        let addr = listener.local_addr().expect("Listener has no local address");

        let router = self.router();
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        RunningApi {
            url: Url::parse(&format!("http://{addr}")).expect("Socket address forms a valid URL"),
            task,
        }
    }
}

async fn get_stock(
    State(api): State<FakeStoreApi>,
    Path(id): Path<i32>,
    headers: HeaderMap,
) -> Response {
    api.inner.stock_hits.fetch_add(1, Ordering::SeqCst);

    if !api.authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "missing or invalid token").into_response();
    }

    if let Some(status) = *lock(&api.inner.stock_failure) {
        return (status, "stock service unavailable").into_response();
    }

    let amount = lock(&api.inner.stock).get(&id).copied();
    match amount {
        Some(amount) if api.inner.amount_only.load(Ordering::SeqCst) => {
            Json(serde_json::json!({ "amount": amount })).into_response()
        }
        Some(amount) => Json(serde_json::json!({ "id": id, "amount": amount })).into_response(),
        None => (StatusCode::NOT_FOUND, Json(serde_json::json!({}))).into_response(),
    }
}

async fn get_product(
    State(api): State<FakeStoreApi>,
    Path(id): Path<i32>,
    headers: HeaderMap,
) -> Response {
    api.inner.product_hits.fetch_add(1, Ordering::SeqCst);

    if !api.authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "missing or invalid token").into_response();
    }

    let product = lock(&api.inner.products).get(&id).cloned();
    match product {
        Some(product) => Json(product).into_response(),
        None => (StatusCode::NOT_FOUND, Json(serde_json::json!({}))).into_response(),
    }
}

/// A served fake API. Stops serving when dropped.
pub struct RunningApi {
    pub url: Url,
    task: JoinHandle<()>,
}

impl Drop for RunningApi {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// =============================================================================
// Test context
// =============================================================================

/// A running fake API plus a private storage directory.
pub struct TestContext {
    pub api: RunningApi,
    pub storage_dir: TempDir,
}

/// An opened cart and the notifications it raises.
pub struct CartSession {
    pub store: CartStore,
    pub client: ApiClient,
    pub notices: UnboundedReceiver<Notification>,
}

impl CartSession {
    /// Drain notifications raised so far.
    pub fn notices(&mut self) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Ok(notice) = self.notices.try_recv() {
            out.push(notice);
        }
        out
    }

    /// `(product id, amount)` pairs in cart order.
    #[must_use]
    pub fn amounts(&self) -> Vec<(i32, u32)> {
        self.store
            .cart()
            .iter()
            .map(|item| (item.product_id().as_i32(), item.amount))
            .collect()
    }
}

impl TestContext {
    /// Serve `api` and create an empty storage directory.
    ///
    /// # Panics
    ///
    /// Panics if the server or temporary directory cannot be set up.
    #[allow(clippy::expect_used)]
    pub async fn start(api: &FakeStoreApi) -> Self {
        Self {
            api: api.serve().await,
            storage_dir: TempDir::new().expect("Failed to create storage directory"),
        }
    }

    /// Configuration pointing at the fake API and the private storage directory.
    #[must_use]
    pub fn config(&self) -> CartConfig {
        CartConfig {
            api_url: self.api.url.clone(),
            storage_dir: self.storage_dir.path().to_path_buf(),
            ..CartConfig::default()
        }
    }

    /// Open a cart with the default configuration.
    #[must_use]
    pub fn open_session(&self) -> CartSession {
        self.open_session_with(&self.config())
    }

    /// Open a cart with a bearer token.
    #[must_use]
    pub fn open_session_with_token(&self, token: &str) -> CartSession {
        let config = CartConfig {
            api_token: Some(SecretString::from(token.to_string())),
            ..self.config()
        };
        self.open_session_with(&config)
    }

    /// Open a cart, reading whatever is persisted in the storage directory.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built or storage cannot be read.
    #[allow(clippy::expect_used)]
    #[must_use]
    pub fn open_session_with(&self, config: &CartConfig) -> CartSession {
        let client = ApiClient::new(config).expect("Failed to build API client");
        let (notifier, notices) = ChannelNotifier::channel();

        let store = CartStore::initialize(
            Arc::new(client.clone()),
            Arc::new(client.clone()),
            Arc::new(FileStorage::new(&config.storage_dir)),
            Arc::new(notifier),
        )
        .expect("Failed to initialize cart store");

        CartSession {
            store,
            client,
            notices,
        }
    }
}

/// A catalog product with a realistic shape.
#[must_use]
pub fn sneaker(id: i32) -> Product {
    Product {
        id: ProductId::new(id),
        title: format!("Tênis de Caminhada Leve Confortável {id}"),
        price: Decimal::new(1799, 1) + Decimal::from(id),
        image: format!("https://rocketseat-cdn.s3-sa-east-1.amazonaws.com/modulo-redux/tenis{id}.jpg"),
    }
}
