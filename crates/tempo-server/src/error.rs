//! Error types for the HTTP layer.
//!
//! [`ApiError`] unifies all failure modes into a single enum that can be
//! converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tempo_store::StoreError;
use tracing::error;

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No valid session accompanied the request.
    #[error("not authenticated")]
    Unauthenticated,

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request body or parameters were invalid.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The key-value store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Unauthenticated => (StatusCode::UNAUTHORIZED, self.to_string()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Store(e) => {
                error!(error = %e, "store failure while handling request");
                (StatusCode::INTERNAL_SERVER_ERROR, "storage unavailable".to_owned())
            }
            Self::Internal(msg) => {
                error!(error = %msg, "internal error while handling request");
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
