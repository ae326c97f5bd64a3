//! Unified error handling for the mirror's HTTP surface.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::jobs::QueueError;
use crate::services::SyncError;

/// Application-level error type for HTTP handlers.
///
/// Responses carry a JSON body `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum AppError {
    /// Synchronization failed.
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Job could not be queued.
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    /// Request is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Sync(_) | Self::Queue(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Message shown to the client. Server-side details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            Self::Unauthorized(msg) | Self::BadRequest(msg) => msg.clone(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Mirror request error"
            );
        }

        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("Missing product ID".to_string());
        assert_eq!(err.to_string(), "Bad request: Missing product ID");

        let err = AppError::Sync(SyncError::MissingExternalId);
        assert_eq!(err.to_string(), "Sync error: product has no Shopify ID");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::Unauthorized("Unauthorized".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Sync(SyncError::MissingExternalId)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Queue(QueueError::Serialize(
                serde_json::from_str::<serde_json::Value>("{").unwrap_err()
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::Sync(SyncError::MissingExternalId);
        assert_eq!(err.public_message(), "Internal server error");

        let err = AppError::Unauthorized("Invalid signature".to_string());
        assert_eq!(err.public_message(), "Invalid signature");
    }
}
