//! Mirrored product types.
//!
//! [`ShopifyProductData`] is the normalized form of a Shopify REST payload
//! (see [`crate::mapping`]); [`Product`] is the row stored locally.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::status::ProductStatus;

/// A product variant, embedded in the product row as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    /// Variant title (combination of option values).
    pub title: Option<String>,
    /// SKU code.
    pub sku: Option<String>,
    /// Price as a decimal string, e.g. `"19.99"`.
    pub price: String,
    /// Compare-at price, when the variant is on sale.
    pub compare_at_price: Option<String>,
    /// Inventory quantity across all locations.
    pub inventory_quantity: Option<i64>,
}

/// A product image, embedded in the product row as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// CDN URL of the image.
    pub src: String,
    /// Alt text.
    pub alt: Option<String>,
    /// 1-based position in the gallery.
    pub position: Option<i64>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

/// A product as received from Shopify, after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopifyProductData {
    /// Shopify product ID. The only key used for upserts.
    pub shopify_id: String,
    pub title: String,
    /// HTML description (`body_html`).
    pub description: Option<String>,
    /// URL slug.
    pub handle: String,
    pub vendor: Option<String>,
    pub product_type: Option<String>,
    pub status: ProductStatus,
    pub tags: Vec<String>,
    pub variants: Vec<Variant>,
    pub images: Vec<Image>,
    pub published_at: Option<DateTime<Utc>>,
}

/// A product row in the local mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Internal primary key.
    pub id: ProductId,
    /// Shopify product ID (unique).
    pub shopify_id: String,
    pub title: String,
    pub description: Option<String>,
    pub handle: String,
    pub vendor: Option<String>,
    pub product_type: Option<String>,
    pub status: ProductStatus,
    pub tags: Vec<String>,
    pub variants: Vec<Variant>,
    pub images: Vec<Image>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Build a new row from normalized data.
    ///
    /// Used by in-memory stores; Postgres assigns ids and timestamps itself.
    #[must_use]
    pub fn from_data(id: ProductId, data: ShopifyProductData, now: DateTime<Utc>) -> Self {
        Self {
            id,
            shopify_id: data.shopify_id,
            title: data.title,
            description: data.description,
            handle: data.handle,
            vendor: data.vendor,
            product_type: data.product_type,
            status: data.status,
            tags: data.tags,
            variants: data.variants,
            images: data.images,
            published_at: data.published_at,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite every mapped field with `data`, keeping id and `created_at`.
    pub fn apply(&mut self, data: ShopifyProductData, now: DateTime<Utc>) {
        self.title = data.title;
        self.description = data.description;
        self.handle = data.handle;
        self.vendor = data.vendor;
        self.product_type = data.product_type;
        self.status = data.status;
        self.tags = data.tags;
        self.variants = data.variants;
        self.images = data.images;
        self.published_at = data.published_at;
        self.updated_at = now;
    }
}
