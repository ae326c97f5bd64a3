//! Catalog Mirror Core - Shared product types.
//!
//! This crate provides the types used across all Catalog Mirror components:
//! - `mirror` - Webhook server, job workers and the local product store
//! - `cli` - Operator commands for migrations, syncing and inspection
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. The `postgres` feature adds `sqlx` trait impls.
//!
//! # Modules
//!
//! - [`types`] - Product rows, embedded variants/images, status and IDs
//! - [`mapping`] - Normalization of raw Shopify REST payloads

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod mapping;
pub mod types;

pub use types::*;
