//! Integration tests for Catalog Mirror.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p catalog-mirror-integration-tests
//!
//! # Include the PostgreSQL-backed tests
//! MIRROR_DATABASE_URL=postgres://... cargo test -p catalog-mirror-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `webhooks` - Signed deliveries through the full router
//! - `sync_service` - Upsert/delete semantics of the sync service
//! - `full_sync` - Page fan-out driven through the job runner
//!
//! Tests run against [`MemoryProductStore`], [`MemoryJobQueue`] and a
//! [`FakeCatalog`], so no database or network is needed.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use catalog_mirror::db::MemoryProductStore;
use catalog_mirror::jobs::{JobRunner, MemoryJobQueue};
use catalog_mirror::middleware::{HMAC_HEADER, compute_signature};
use catalog_mirror::routes::webhooks::TOPIC_HEADER;
use catalog_mirror::services::ProductSyncService;
use catalog_mirror::shopify::{CatalogSource, ProductsPage, ShopifyError};
use catalog_mirror::{AppState, app};
use secrecy::SecretString;
use serde_json::Value;

/// Webhook secret configured in every [`TestContext`].
pub const WEBHOOK_SECRET: &str = "integration-test-webhook-secret";

/// Catalog served from memory.
///
/// Pages are keyed by continuation token, with `None` as the first page.
#[derive(Debug, Default)]
pub struct FakeCatalog {
    pages: HashMap<Option<String>, ProductsPage>,
    products: HashMap<String, Value>,
}

impl FakeCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `products` for `token`, pointing at `next`.
    #[must_use]
    pub fn with_page(mut self, token: Option<&str>, products: Vec<Value>, next: Option<&str>) -> Self {
        self.pages.insert(
            token.map(String::from),
            ProductsPage {
                products,
                next_page_info: next.map(String::from),
            },
        );
        self
    }

    /// Serve `product` from the single-product endpoint.
    #[must_use]
    pub fn with_product(mut self, shopify_id: &str, product: Value) -> Self {
        self.products.insert(shopify_id.to_string(), product);
        self
    }
}

#[async_trait]
impl CatalogSource for FakeCatalog {
    async fn fetch_page(&self, page_info: Option<&str>) -> Result<ProductsPage, ShopifyError> {
        Ok(self
            .pages
            .get(&page_info.map(String::from))
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_product(&self, shopify_id: &str) -> Result<Option<Value>, ShopifyError> {
        Ok(self.products.get(shopify_id).cloned())
    }
}

/// Everything a test needs, wired the way the server wires it.
pub struct TestContext {
    pub store: Arc<MemoryProductStore>,
    pub queue: Arc<MemoryJobQueue>,
    pub sync: ProductSyncService,
    pub state: AppState,
}

impl TestContext {
    /// Context with the shared webhook secret configured.
    #[must_use]
    pub fn new() -> Self {
        Self::with_secret(Some(WEBHOOK_SECRET))
    }

    /// Context with an explicit (or no) webhook secret.
    #[must_use]
    pub fn with_secret(secret: Option<&str>) -> Self {
        let store = Arc::new(MemoryProductStore::new());
        let queue = Arc::new(MemoryJobQueue::new());
        let sync = ProductSyncService::new(store.clone(), queue.clone());
        let state = AppState::new(sync.clone(), secret.map(SecretString::from));

        Self {
            store,
            queue,
            sync,
            state,
        }
    }

    /// The full application router.
    #[must_use]
    pub fn router(&self) -> axum::Router {
        app(self.state.clone())
    }

    /// Job runner over this context's queue and `catalog`.
    #[must_use]
    pub fn runner(&self, catalog: FakeCatalog) -> JobRunner {
        JobRunner::new(Arc::new(catalog), self.sync.clone())
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// `POST /webhooks/shopify` signed with [`WEBHOOK_SECRET`].
#[must_use]
pub fn signed_webhook(topic: &str, body: &str) -> Request<Body> {
    let signature = compute_signature(WEBHOOK_SECRET.as_bytes(), body.as_bytes());
    webhook_request(Some(topic), Some(&signature), body)
}

/// `POST /webhooks/shopify` with arbitrary topic and signature headers.
///
/// # Panics
///
/// Panics if a header value is not valid.
#[must_use]
pub fn webhook_request(topic: Option<&str>, signature: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhooks/shopify")
        .header("content-type", "application/json");
    if let Some(topic) = topic {
        builder = builder.header(TOPIC_HEADER, topic);
    }
    if let Some(signature) = signature {
        builder = builder.header(HMAC_HEADER, signature);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("valid webhook request")
}

/// Read a response body as JSON.
///
/// # Panics
///
/// Panics if the body cannot be read or is not JSON.
pub async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    serde_json::from_slice(&bytes).expect("JSON body")
}
