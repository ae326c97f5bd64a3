//! Shopify product webhook receiver.
//!
//! Create and update deliveries are queued as [`Job::SyncProduct`] so the
//! response returns before the upsert. Deletes are applied inline.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::HeaderMap,
    middleware::from_fn_with_state,
    routing::post,
};
use catalog_mirror_core::mapping::external_id;
use serde_json::{Value, json};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::jobs::Job;
use crate::middleware::{MAX_BODY_BYTES, verify_shopify_webhook};
use crate::state::AppState;

/// Header naming the event, e.g. `products/update`.
pub const TOPIC_HEADER: &str = "X-Shopify-Topic";

/// Webhook routes, guarded by signature verification.
///
/// The handler's body limit matches the verifier's so that every verified
/// delivery is also extractable.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/webhooks/shopify", post(handle_webhook))
        .route_layer(from_fn_with_state(state, verify_shopify_webhook))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}

fn message(text: &str) -> Json<Value> {
    Json(json!({ "message": text }))
}

/// Dispatch a verified delivery by topic.
#[instrument(skip(state, headers, body), fields(topic = tracing::field::Empty))]
async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let topic = headers
        .get(TOPIC_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    tracing::Span::current().record("topic", topic);

    match topic {
        "products/create" | "products/update" => {
            let payload: Value = serde_json::from_slice(&body)
                .map_err(|_| AppError::BadRequest("Invalid JSON payload".to_string()))?;

            state.sync().queue().enqueue(Job::SyncProduct { payload }).await?;
            info!("Product queued for sync");
            Ok(message("Queued for sync"))
        }
        "products/delete" => {
            let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
            let shopify_id = external_id(&payload)
                .ok_or_else(|| AppError::BadRequest("Missing product ID".to_string()))?;

            // Absent rows are fine: Shopify may deliver a delete more than once.
            state.sync().delete_by_shopify_id(&shopify_id).await?;
            Ok(message("Product deleted"))
        }
        _ => {
            info!("Ignoring unhandled webhook topic");
            Ok(message("Unhandled topic"))
        }
    }
}
