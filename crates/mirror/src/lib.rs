//! Catalog Mirror - keeps a local copy of a Shopify product catalog.
//!
//! # Architecture
//!
//! - Axum web framework for the webhook receiver and health checks
//! - Shopify Admin REST API as the catalog source
//! - `PostgreSQL` for mirrored products and the job queue
//! - Polling workers for full-sync fan-out
//!
//! # Data Flow
//!
//! ```text
//! mirror-cli sync ──► FetchProductsPage ──► SyncProduct ×N ──┐
//!                          │                                 ├─► ProductSyncService ──► products
//!                          └─► FetchProductsPage (next) ...  │
//! POST /webhooks/shopify ──► SyncProduct / delete ───────────┘
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod jobs;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod shopify;
pub mod state;

pub use config::MirrorConfig;
pub use error::AppError;
pub use routes::app;
pub use state::AppState;
