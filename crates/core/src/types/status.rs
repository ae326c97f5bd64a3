//! Product publication status.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a string is not one of the known status values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid product status: {0}")]
pub struct ParseStatusError(pub String);

/// Product status as reported by Shopify.
///
/// Stored in the `product_status` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "product_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    /// Visible on the storefront.
    #[default]
    Active,
    /// Work in progress, not visible.
    Draft,
    /// Hidden from the storefront and admin lists.
    Archived,
}

impl ProductStatus {
    /// Lowercase wire value (`active`, `draft`, `archived`).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Draft => "draft",
            Self::Archived => "archived",
        }
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProductStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "draft" => Ok(Self::Draft),
            "archived" => Ok(Self::Archived),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_active() {
        assert_eq!(ProductStatus::default(), ProductStatus::Active);
    }

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!("ACTIVE".parse::<ProductStatus>(), Ok(ProductStatus::Active));
        assert_eq!(" Draft ".parse::<ProductStatus>(), Ok(ProductStatus::Draft));
        assert_eq!("archived".parse::<ProductStatus>(), Ok(ProductStatus::Archived));
    }

    #[test]
    fn test_from_str_rejects_unknown() {
        let err = "unlisted".parse::<ProductStatus>().unwrap_err();
        assert_eq!(err.to_string(), "invalid product status: unlisted");
    }

    #[test]
    fn test_display_matches_serde() {
        for status in [
            ProductStatus::Active,
            ProductStatus::Draft,
            ProductStatus::Archived,
        ] {
            let json = serde_json::to_string(&status).unwrap_or_default();
            assert_eq!(json, format!("\"{status}\""));
        }
    }
}
