//! Normalization of raw Shopify REST product payloads.
//!
//! The mapping is total: any JSON value produces a [`ShopifyProductData`],
//! with missing or mistyped keys replaced by defaults.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::types::{Image, ProductStatus, ShopifyProductData, Variant};

/// Price used when a variant payload carries none.
pub const DEFAULT_VARIANT_PRICE: &str = "0.00";

impl ShopifyProductData {
    /// Normalize a product object from the Shopify Admin REST API.
    ///
    /// ```rust
    /// use catalog_mirror_core::{ProductStatus, ShopifyProductData};
    ///
    /// let data = ShopifyProductData::from_api_response(&serde_json::json!({
    ///     "id": 632910392,
    ///     "title": "IPod Nano",
    ///     "tags": "Emotive, Flash Memory",
    /// }));
    ///
    /// assert_eq!(data.shopify_id, "632910392");
    /// assert_eq!(data.handle, "");
    /// assert_eq!(data.tags, vec!["Emotive", "Flash Memory"]);
    /// assert_eq!(data.status, ProductStatus::Active);
    /// ```
    #[must_use]
    pub fn from_api_response(data: &Value) -> Self {
        Self {
            shopify_id: external_id(data).unwrap_or_default(),
            title: string_field(data, "title").unwrap_or_default(),
            description: string_field(data, "body_html"),
            handle: string_field(data, "handle").unwrap_or_default(),
            vendor: string_field(data, "vendor"),
            product_type: string_field(data, "product_type"),
            status: parse_status(data.get("status")),
            tags: parse_tags(data.get("tags")),
            variants: array_field(data, "variants").map(map_variant).collect(),
            images: array_field(data, "images").map(map_image).collect(),
            published_at: string_field(data, "published_at")
                .as_deref()
                .and_then(parse_timestamp),
        }
    }
}

/// The payload's `id` as a string, or `None` when absent or empty.
///
/// Webhook delete payloads carry only `{"id": ...}`, so this is usable on
/// partial objects.
#[must_use]
pub fn external_id(data: &Value) -> Option<String> {
    scalar_string(data.get("id")).filter(|id| !id.trim().is_empty())
}

fn map_variant(v: &Value) -> Variant {
    Variant {
        title: string_field(v, "title"),
        sku: string_field(v, "sku"),
        price: scalar_string(v.get("price")).unwrap_or_else(|| DEFAULT_VARIANT_PRICE.to_string()),
        compare_at_price: scalar_string(v.get("compare_at_price")),
        inventory_quantity: int_field(v, "inventory_quantity"),
    }
}

fn map_image(img: &Value) -> Image {
    Image {
        src: string_field(img, "src").unwrap_or_default(),
        alt: string_field(img, "alt"),
        position: int_field(img, "position"),
        width: int_field(img, "width"),
        height: int_field(img, "height"),
    }
}

/// Split Shopify's comma-separated tag string.
///
/// A blank string yields no tags. Arrays (as sent by some webhook versions)
/// are taken element by element.
fn parse_tags(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(tags)) if !tags.trim().is_empty() => {
            tags.split(',').map(|t| t.trim().to_string()).collect()
        }
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

/// Absent status means active; anything unrecognised is treated as draft.
fn parse_status(value: Option<&Value>) -> ProductStatus {
    match value {
        None | Some(Value::Null) => ProductStatus::Active,
        Some(Value::String(s)) => s.parse().unwrap_or(ProductStatus::Draft),
        Some(_) => ProductStatus::Draft,
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn string_field(obj: &Value, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(String::from)
}

fn int_field(obj: &Value, key: &str) -> Option<i64> {
    match obj.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Strings as-is, numbers in their decimal form.
fn scalar_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn array_field<'a>(obj: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    obj.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample() -> Value {
        json!({
            "id": "9999999",
            "title": "Integration Test Product",
            "body_html": "<p>Test description</p>",
            "handle": "integration-test-product",
            "vendor": "Test Vendor",
            "product_type": "Widget",
            "status": "active",
            "tags": "test, integration",
            "published_at": "2024-06-01T12:00:00-04:00",
            "variants": [
                {"title": "Small", "sku": "W-SM", "price": "19.99", "compare_at_price": "24.99", "inventory_quantity": 50},
                {"title": "Large", "sku": "W-LG", "price": "24.99", "compare_at_price": null, "inventory_quantity": 30}
            ],
            "images": [
                {"src": "https://cdn.shopify.com/test.jpg", "alt": "Integration Test Product", "position": 1, "width": 640, "height": 480}
            ]
        })
    }

    #[test]
    fn test_maps_full_payload() {
        let data = ShopifyProductData::from_api_response(&sample());

        assert_eq!(data.shopify_id, "9999999");
        assert_eq!(data.title, "Integration Test Product");
        assert_eq!(data.description.as_deref(), Some("<p>Test description</p>"));
        assert_eq!(data.vendor.as_deref(), Some("Test Vendor"));
        assert_eq!(data.product_type.as_deref(), Some("Widget"));
        assert_eq!(data.tags, vec!["test", "integration"]);
        assert_eq!(data.variants.len(), 2);
        assert_eq!(data.variants[1].compare_at_price, None);
        assert_eq!(data.variants[0].inventory_quantity, Some(50));
        assert_eq!(data.images.len(), 1);
        assert_eq!(data.images[0].width, Some(640));
        assert_eq!(
            data.published_at.map(|dt| dt.to_rfc3339()),
            Some("2024-06-01T16:00:00+00:00".to_string())
        );
    }

    #[test]
    fn test_empty_payload_uses_defaults() {
        let data = ShopifyProductData::from_api_response(&json!({}));

        assert_eq!(data.shopify_id, "");
        assert_eq!(data.title, "");
        assert_eq!(data.handle, "");
        assert_eq!(data.description, None);
        assert_eq!(data.vendor, None);
        assert_eq!(data.status, ProductStatus::Active);
        assert!(data.tags.is_empty());
        assert!(data.variants.is_empty());
        assert!(data.images.is_empty());
        assert_eq!(data.published_at, None);
    }

    #[test]
    fn test_non_object_payload_does_not_fail() {
        let data = ShopifyProductData::from_api_response(&json!("not a product"));
        assert_eq!(data.shopify_id, "");

        let data = ShopifyProductData::from_api_response(&Value::Null);
        assert!(data.variants.is_empty());
    }

    #[test]
    fn test_numeric_id_is_stringified() {
        let data = ShopifyProductData::from_api_response(&json!({"id": 632_910_392}));
        assert_eq!(data.shopify_id, "632910392");
    }

    #[test]
    fn test_blank_tags_yield_empty_list() {
        let data = ShopifyProductData::from_api_response(&json!({"tags": "   "}));
        assert!(data.tags.is_empty());
    }

    #[test]
    fn test_tags_are_trimmed() {
        let data = ShopifyProductData::from_api_response(&json!({"tags": " a ,b,  c"}));
        assert_eq!(data.tags, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_tag_array_is_accepted() {
        let data = ShopifyProductData::from_api_response(&json!({"tags": ["x", " y ", 3]}));
        assert_eq!(data.tags, vec!["x", "y"]);
    }

    #[test]
    fn test_variant_defaults() {
        let data = ShopifyProductData::from_api_response(&json!({"variants": [{}, "junk"]}));

        assert_eq!(data.variants.len(), 2);
        for variant in &data.variants {
            assert_eq!(variant.price, DEFAULT_VARIANT_PRICE);
            assert_eq!(variant.title, None);
            assert_eq!(variant.sku, None);
            assert_eq!(variant.inventory_quantity, None);
        }
    }

    #[test]
    fn test_numeric_price_is_stringified() {
        let data = ShopifyProductData::from_api_response(&json!({"variants": [{"price": 5}]}));
        assert_eq!(data.variants[0].price, "5");
    }

    #[test]
    fn test_image_defaults() {
        let data = ShopifyProductData::from_api_response(&json!({"images": [{"alt": "x"}]}));

        assert_eq!(data.images[0].src, "");
        assert_eq!(data.images[0].alt.as_deref(), Some("x"));
        assert_eq!(data.images[0].position, None);
    }

    #[test]
    fn test_status_parsing() {
        let status = |v: Value| ShopifyProductData::from_api_response(&json!({"status": v})).status;

        assert_eq!(status(json!("draft")), ProductStatus::Draft);
        assert_eq!(status(json!("ARCHIVED")), ProductStatus::Archived);
        assert_eq!(status(json!(null)), ProductStatus::Active);
        assert_eq!(status(json!("unlisted")), ProductStatus::Draft);
        assert_eq!(status(json!(1)), ProductStatus::Draft);
    }

    #[test]
    fn test_invalid_published_at_is_dropped() {
        let data = ShopifyProductData::from_api_response(&json!({"published_at": "yesterday"}));
        assert_eq!(data.published_at, None);
    }

    #[test]
    fn test_external_id() {
        assert_eq!(external_id(&json!({"id": 9_999_999})).as_deref(), Some("9999999"));
        assert_eq!(external_id(&json!({"id": "abc"})).as_deref(), Some("abc"));
        assert_eq!(external_id(&json!({"id": ""})), None);
        assert_eq!(external_id(&json!({"id": null})), None);
        assert_eq!(external_id(&json!({})), None);
    }
}
