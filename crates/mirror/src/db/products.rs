//! `PostgreSQL` product repository.

use async_trait::async_trait;
use catalog_mirror_core::{Image, Product, ProductId, ProductStatus, ShopifyProductData, Variant};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use super::{Pagination, ProductFilter, ProductPage, ProductStore, RepositoryError, SyncOutcome};

const PRODUCT_COLUMNS: &str = "id, shopify_id, title, description, handle, vendor, product_type, \
     status, tags, variants, images, published_at, created_at, updated_at";

// =============================================================================
// Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` queries.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    shopify_id: String,
    title: String,
    description: Option<String>,
    handle: String,
    vendor: Option<String>,
    product_type: Option<String>,
    status: ProductStatus,
    tags: Json<Vec<String>>,
    variants: Json<Vec<Variant>>,
    images: Json<Vec<Image>>,
    published_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            shopify_id: row.shopify_id,
            title: row.title,
            description: row.description,
            handle: row.handle,
            vendor: row.vendor,
            product_type: row.product_type,
            status: row.status,
            tags: row.tags.0,
            variants: row.variants.0,
            images: row.images.0,
            published_at: row.published_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Upsert result: the stored row plus whether it was inserted.
#[derive(Debug, sqlx::FromRow)]
struct UpsertRow {
    #[sqlx(flatten)]
    product: ProductRow,
    created: bool,
}

// =============================================================================
// Repository
// =============================================================================

/// Product store backed by the `products` table.
#[derive(Debug, Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    /// `xmax = 0` holds only for rows inserted by this statement, which is how
    /// the insert/update distinction is reported.
    #[instrument(skip(self, data), fields(shopify_id = %data.shopify_id))]
    async fn upsert(&self, data: ShopifyProductData) -> Result<SyncOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, UpsertRow>(&format!(
            r"
            INSERT INTO products (
                shopify_id, title, description, handle, vendor, product_type,
                status, tags, variants, images, published_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (shopify_id) DO UPDATE SET
                title = EXCLUDED.title,
                description = EXCLUDED.description,
                handle = EXCLUDED.handle,
                vendor = EXCLUDED.vendor,
                product_type = EXCLUDED.product_type,
                status = EXCLUDED.status,
                tags = EXCLUDED.tags,
                variants = EXCLUDED.variants,
                images = EXCLUDED.images,
                published_at = EXCLUDED.published_at,
                updated_at = NOW()
            RETURNING {PRODUCT_COLUMNS}, (xmax = 0) AS created
            "
        ))
        .bind(&data.shopify_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.handle)
        .bind(&data.vendor)
        .bind(&data.product_type)
        .bind(data.status)
        .bind(Json(&data.tags))
        .bind(Json(&data.variants))
        .bind(Json(&data.images))
        .bind(data.published_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(SyncOutcome {
            product: row.product.into(),
            created: row.created,
        })
    }

    #[instrument(skip(self))]
    async fn delete_by_shopify_id(&self, shopify_id: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE shopify_id = $1")
            .bind(shopify_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    async fn find_by_shopify_id(
        &self,
        shopify_id: &str,
    ) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE shopify_id = $1"
        ))
        .bind(shopify_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        to_u64(count)
    }

    #[instrument(skip(self))]
    async fn list(
        &self,
        filter: &ProductFilter,
        pagination: Pagination,
    ) -> Result<ProductPage, RepositoryError> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products");
        push_filters(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;
        let total = to_u64(total)?;

        let limit = i64::from(pagination.first);
        let offset = i64::try_from(pagination.offset())
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;

        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {PRODUCT_COLUMNS} FROM products"));
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY id LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = query
            .build_query_as::<ProductRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(ProductPage {
            products: rows.into_iter().map(Product::from).collect(),
            total,
            current_page: pagination.page,
            last_page: pagination.last_page(total),
        })
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Append `WHERE` clauses for the filter.
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    let mut separator = " WHERE ";

    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = format!("%{}%", escape_like(search.trim()));
        builder
            .push(separator)
            .push("(title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR vendor ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR handle ILIKE ")
            .push_bind(pattern)
            .push(")");
        separator = " AND ";
    }

    if let Some(status) = filter.status {
        builder.push(separator).push("status = ").push_bind(status);
        separator = " AND ";
    }

    if let Some(vendor) = &filter.vendor {
        builder.push(separator).push("vendor = ").push_bind(vendor.clone());
    }
}

/// Escape `LIKE` wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn to_u64(count: i64) -> Result<u64, RepositoryError> {
    u64::try_from(count).map_err(|_| RepositoryError::DataCorruption(format!("negative count {count}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_push_filters_builds_where_clause() {
        let filter = ProductFilter {
            search: Some("widget".to_string()),
            status: Some(ProductStatus::Draft),
            vendor: Some("Acme".to_string()),
        };

        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products");
        push_filters(&mut builder, &filter);

        assert_eq!(
            builder.sql(),
            "SELECT COUNT(*) FROM products WHERE (title ILIKE $1 OR vendor ILIKE $2 OR handle ILIKE $3) \
             AND status = $4 AND vendor = $5"
        );
    }

    #[test]
    fn test_push_filters_skips_blank_search() {
        let filter = ProductFilter {
            search: Some("   ".to_string()),
            ..ProductFilter::default()
        };

        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 FROM products");
        push_filters(&mut builder, &filter);

        assert_eq!(builder.sql(), "SELECT 1 FROM products");
    }

    #[tokio::test]
    #[ignore = "Requires a PostgreSQL database (MIRROR_DATABASE_URL) with migrations applied"]
    async fn test_upsert_reports_created_then_updated() {
        let url = std::env::var("MIRROR_DATABASE_URL").unwrap_or_default();
        let pool = PgPool::connect(&url).await.expect("Failed to connect");
        let store = PgProductStore::new(pool);

        let mut data = ShopifyProductData::from_api_response(&serde_json::json!({
            "id": "pg-upsert-test",
            "title": "First",
            "handle": "first",
        }));

        let first = store.upsert(data.clone()).await.expect("first upsert");
        data.title = "Second".to_string();
        let second = store.upsert(data).await.expect("second upsert");

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.product.id, second.product.id);
        assert_eq!(second.product.title, "Second");

        assert!(store.delete_by_shopify_id("pg-upsert-test").await.expect("delete"));
    }
}
