//! HTTP middleware for the mirror.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, bind request to hub)
//! 2. `TraceLayer` (request tracing)
//! 3. Webhook signature verification (webhook routes only)

pub mod webhook;

pub use webhook::{
    HMAC_HEADER, MAX_BODY_BYTES, compute_signature, verify_shopify_webhook, verify_signature,
};
