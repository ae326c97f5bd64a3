//! Cursor extraction from Shopify's `Link` response header.
//!
//! Shopify paginates REST listings with a header like:
//!
//! ```text
//! <https://shop.myshopify.com/admin/api/2024-01/products.json?limit=50&page_info=abc>; rel="previous",
//! <https://shop.myshopify.com/admin/api/2024-01/products.json?limit=50&page_info=def>; rel="next"
//! ```

use std::sync::LazyLock;

use regex::Regex;

/// Matches the `page_info` value of the `rel="next"` link.
static NEXT_PAGE_INFO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<[^>]*[?&]page_info=([^&>]*)[^>]*>[^,]*rel="next""#).expect("Invalid regex")
});

/// Extract the next-page cursor, or `None` when there is no `rel="next"` link.
#[must_use]
pub fn extract_next_page_info(link_header: Option<&str>) -> Option<String> {
    let header = link_header?;
    NEXT_PAGE_INFO_RE
        .captures(header)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_only() {
        let header = r#"<https://shop.myshopify.com/admin/api/2024-01/products.json?limit=50&page_info=eyJsYXN0X2lkIjo0fQ>; rel="next""#;
        assert_eq!(
            extract_next_page_info(Some(header)).as_deref(),
            Some("eyJsYXN0X2lkIjo0fQ")
        );
    }

    #[test]
    fn test_previous_and_next() {
        let header = concat!(
            r#"<https://shop.myshopify.com/admin/api/2024-01/products.json?limit=50&page_info=prev123>; rel="previous", "#,
            r#"<https://shop.myshopify.com/admin/api/2024-01/products.json?limit=50&page_info=next456>; rel="next""#
        );
        assert_eq!(extract_next_page_info(Some(header)).as_deref(), Some("next456"));
    }

    #[test]
    fn test_page_info_before_limit() {
        let header = r#"<https://shop.myshopify.com/admin/api/2024-01/products.json?page_info=abc&limit=50>; rel="next""#;
        assert_eq!(extract_next_page_info(Some(header)).as_deref(), Some("abc"));
    }

    #[test]
    fn test_previous_and_next_with_trailing_limit() {
        let header = concat!(
            r#"<https://shop.myshopify.com/admin/api/2024-01/products.json?page_info=prevX&limit=50>; rel="previous", "#,
            r#"<https://shop.myshopify.com/admin/api/2024-01/products.json?page_info=nextY&limit=50>; rel="next""#
        );
        assert_eq!(extract_next_page_info(Some(header)).as_deref(), Some("nextY"));
    }

    #[test]
    fn test_other_param_ending_in_page_info_is_ignored() {
        let header = r#"<https://shop.myshopify.com/admin/api/2024-01/products.json?limit=50&not_page_info=x&page_info=real>; rel="next""#;
        assert_eq!(extract_next_page_info(Some(header)).as_deref(), Some("real"));
    }

    #[test]
    fn test_previous_only_is_last_page() {
        let header = r#"<https://shop.myshopify.com/admin/api/2024-01/products.json?limit=50&page_info=prev123>; rel="previous""#;
        assert_eq!(extract_next_page_info(Some(header)), None);
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(extract_next_page_info(None), None);
        assert_eq!(extract_next_page_info(Some("")), None);
    }
}
