//! Error responses
//!
//! Maps [`PokedexError`] to an HTTP status and a JSON body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::PokedexError;

/// JSON body of every error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "statusCode")]
    pub status_code: u16,

    pub message: String,

    /// Reason phrase of the status
    pub error: String,
}

impl PokedexError {
    /// Status code this error is reported with
    pub fn status(&self) -> StatusCode {
        match self {
            PokedexError::BadRequest(_) | PokedexError::DuplicateKey(_) => StatusCode::BAD_REQUEST,
            PokedexError::NotFound(_) => StatusCode::NOT_FOUND,
            PokedexError::StorageFailure(_)
            | PokedexError::FetchFailure { .. }
            | PokedexError::Config(_)
            | PokedexError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PokedexError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // Process errors may carry paths or OS detail
            PokedexError::Config(_) | PokedexError::Io(_) => {
                tracing::error!("Request failed: {}", self);
                "Internal server error - Check server logs".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            status_code: status.as_u16(),
            message,
            error: status.canonical_reason().unwrap_or("Error").to_string(),
        };

        (status, Json(body)).into_response()
    }
}
