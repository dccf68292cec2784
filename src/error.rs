//! Registry errors and their HTTP representation

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::store::StoreError;

/// Failures of the shortcode registry operations
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The submitted URL is missing or not an absolute URL
    #[error("Invalid or missing longUrl: {0}")]
    InvalidInput(String),

    /// No mapping exists for the shortcode
    #[error("Short URL not found: {0}")]
    NotFound(String),

    /// Every generated candidate collided; the caller may retry `shorten`
    #[error("Failed to generate shortcode after {attempts} attempts")]
    AllocationExhausted { attempts: usize },

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl RegistryError {
    pub fn status(&self) -> StatusCode {
        match self {
            RegistryError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
            RegistryError::AllocationExhausted { .. } | RegistryError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for RegistryError {
    fn into_response(self) -> Response {
        let message = match &self {
            RegistryError::Storage(err) => {
                tracing::error!(error = %err, "storage failure");
                "Server error".to_string()
            }
            other => other.to_string(),
        };

        (self.status(), Json(json!({ "error": message }))).into_response()
    }
}
