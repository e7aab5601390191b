use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use datadrop_core::StorageError;

/// Errors surfaced to HTTP clients as `{"detail": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not authenticated")]
    MissingKey,
    #[error("Invalid API Key")]
    InvalidKey,
    #[error("Error saving data: {0}")]
    Save(#[source] StorageError),
    #[error("Error loading feed: {0}")]
    Feed(#[source] StorageError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingKey | ApiError::InvalidKey => StatusCode::FORBIDDEN,
            ApiError::Save(_) | ApiError::Feed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(serde_json::json!({ "detail": self.to_string() })),
        )
            .into_response()
    }
}
