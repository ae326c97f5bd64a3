//! Core types for Catalog Mirror.

pub mod id;
pub mod product;
pub mod status;

pub use id::*;
pub use product::{Image, Product, ShopifyProductData, Variant};
pub use status::{ParseStatusError, ProductStatus};
