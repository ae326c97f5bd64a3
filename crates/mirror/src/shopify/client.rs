//! REST client for the Shopify Admin products endpoints.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::LINK;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::config::ShopifyConfig;

use super::pagination::extract_next_page_info;
use super::{CatalogSource, ProductsPage, ShopifyError};

/// Products requested per listing page.
pub const PAGE_SIZE: u32 = 50;

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct ProductsEnvelope {
    #[serde(default)]
    products: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ProductEnvelope {
    #[serde(default)]
    product: Option<Value>,
}

/// Shopify Admin REST API client.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct ShopifyClient {
    inner: Arc<ShopifyClientInner>,
}

struct ShopifyClientInner {
    client: reqwest::Client,
    base_url: String,
    access_token: SecretString,
}

impl std::fmt::Debug for ShopifyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyClient")
            .field("base_url", &self.inner.base_url)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

impl ShopifyClient {
    /// Create a client for the configured store.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ShopifyConfig) -> Result<Self, ShopifyError> {
        Self::with_base_url(config.base_url(), config.access_token.clone())
    }

    /// Create a client against an explicit API root such as
    /// `https://shop.myshopify.com/admin/api/2024-01`.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Http` if the HTTP client cannot be built.
    pub fn with_base_url(
        base_url: impl Into<String>,
        access_token: SecretString,
    ) -> Result<Self, ShopifyError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(ShopifyClientInner {
                client,
                base_url: base_url.into().trim_end_matches('/').to_string(),
                access_token,
            }),
        })
    }

    /// API root this client talks to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.inner
            .client
            .get(url)
            .header(ACCESS_TOKEN_HEADER, self.inner.access_token.expose_secret())
    }
}

#[async_trait]
impl CatalogSource for ShopifyClient {
    #[instrument(skip(self))]
    async fn fetch_page(&self, page_info: Option<&str>) -> Result<ProductsPage, ShopifyError> {
        let url = format!("{}/products.json", self.inner.base_url);

        let mut request = self.get(&url).query(&[("limit", PAGE_SIZE.to_string())]);
        if let Some(token) = page_info {
            request = request.query(&[("page_info", token)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ShopifyError::Status { status, url });
        }

        let next_page_info = extract_next_page_info(
            response
                .headers()
                .get(LINK)
                .and_then(|value| value.to_str().ok()),
        );

        let body = response.text().await?;
        let envelope: ProductsEnvelope = serde_json::from_str(&body)?;

        info!(
            count = envelope.products.len(),
            has_next_page = next_page_info.is_some(),
            "Fetched products page"
        );

        Ok(ProductsPage {
            products: envelope.products,
            next_page_info,
        })
    }

    #[instrument(skip(self))]
    async fn fetch_product(&self, shopify_id: &str) -> Result<Option<Value>, ShopifyError> {
        let url = format!("{}/products/{shopify_id}.json", self.inner.base_url);

        let response = self.get(&url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!("Product not found in Shopify");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ShopifyError::Status { status, url });
        }

        let body = response.text().await?;
        let envelope: ProductEnvelope = serde_json::from_str(&body)?;

        Ok(envelope.product.filter(|product| !product.is_null()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use axum::{
        Json, Router,
        extract::Query,
        http::{HeaderMap, StatusCode as HttpStatus},
        response::{IntoResponse, Response},
        routing::get,
    };
    use serde_json::json;

    use super::*;

    const TOKEN: &str = "shpat_test";

    /// Listing stub: checks the token and page size, and links to a second
    /// page named after the cursor it was given.
    async fn products(headers: HeaderMap, Query(params): Query<HashMap<String, String>>) -> Response {
        if headers.get(ACCESS_TOKEN_HEADER).and_then(|v| v.to_str().ok()) != Some(TOKEN) {
            return HttpStatus::UNAUTHORIZED.into_response();
        }
        if params.get("limit").map(String::as_str) != Some("50") {
            return HttpStatus::BAD_REQUEST.into_response();
        }

        match params.get("page_info") {
            None => (
                [(
                    "link",
                    r#"<https://test.myshopify.com/admin/api/2024-01/products.json?page_info=page2&limit=50>; rel="next""#,
                )],
                Json(json!({"products": [{"id": 1}, {"id": 2}]})),
            )
                .into_response(),
            Some(token) => Json(json!({"products": [{"id": 3, "title": token}]})).into_response(),
        }
    }

    /// Serve the stub on an ephemeral port and return its address.
    async fn serve() -> String {
        let app = Router::new()
            .route("/ok/products.json", get(products))
            .route("/ok/products/1.json", get(|| async { Json(json!({"product": {"id": 1, "title": "One"}})) }))
            .route("/ok/products/2.json", get(|| async { Json(json!({"product": null})) }))
            .route("/broken/products.json", get(|| async { HttpStatus::INTERNAL_SERVER_ERROR }))
            .route("/broken/products/1.json", get(|| async { HttpStatus::TOO_MANY_REQUESTS }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base_url: &str) -> ShopifyClient {
        ShopifyClient::with_base_url(base_url, SecretString::from(TOKEN)).unwrap()
    }

    #[tokio::test]
    async fn test_first_page_reads_link_cursor() {
        let base = serve().await;

        let page = client(&format!("{base}/ok")).fetch_page(None).await.unwrap();

        assert_eq!(page.products.len(), 2);
        assert_eq!(page.next_page_info.as_deref(), Some("page2"));
    }

    #[tokio::test]
    async fn test_cursor_is_sent_as_page_info() {
        let base = serve().await;

        let page = client(&format!("{base}/ok"))
            .fetch_page(Some("page2"))
            .await
            .unwrap();

        assert_eq!(page.products, vec![json!({"id": 3, "title": "page2"})]);
        assert_eq!(page.next_page_info, None);
    }

    #[tokio::test]
    async fn test_wrong_token_is_status_error() {
        let base = serve().await;
        let client =
            ShopifyClient::with_base_url(format!("{base}/ok"), SecretString::from("wrong")).unwrap();

        let err = client.fetch_page(None).await.unwrap_err();

        assert!(matches!(
            err,
            ShopifyError::Status { status, .. } if status == StatusCode::UNAUTHORIZED
        ));
    }

    #[tokio::test]
    async fn test_server_error_is_status_error() {
        let base = serve().await;

        let err = client(&format!("{base}/broken")).fetch_page(None).await.unwrap_err();

        match err {
            ShopifyError::Status { status, url } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert!(url.ends_with("/broken/products.json"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_product() {
        let base = serve().await;
        let client = client(&format!("{base}/ok"));

        let product = client.fetch_product("1").await.unwrap();
        assert_eq!(product, Some(json!({"id": 1, "title": "One"})));

        // Null product and unknown ID both mean "not found"
        assert_eq!(client.fetch_product("2").await.unwrap(), None);
        assert_eq!(client.fetch_product("404").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_fetch_product_rate_limited() {
        let base = serve().await;

        let err = client(&format!("{base}/broken")).fetch_product("1").await.unwrap_err();

        assert!(matches!(
            err,
            ShopifyError::Status { status, .. } if status == StatusCode::TOO_MANY_REQUESTS
        ));
    }

    #[test]
    fn test_base_url_trims_trailing_slash() {
        let client = client("https://test.myshopify.com/admin/api/2024-01/");
        assert_eq!(client.base_url(), "https://test.myshopify.com/admin/api/2024-01");
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = ShopifyClient::with_base_url(
            "https://test.myshopify.com/admin/api/2024-01",
            SecretString::from("shpat_super_secret"),
        )
        .unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("shpat_super_secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_products_envelope_defaults_to_empty() {
        let envelope: ProductsEnvelope = serde_json::from_str("{}").unwrap();
        assert!(envelope.products.is_empty());
    }

    #[test]
    fn test_product_envelope_null_product() {
        let envelope: ProductEnvelope = serde_json::from_str(r#"{"product": null}"#).unwrap();
        assert!(envelope.product.is_none());
    }
}
