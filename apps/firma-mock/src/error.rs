//! Error types for the mock signature service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use shared_types::ApiResponse;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MockError {
    #[error("Request not found with ID: {0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidRequest(String),
}

impl MockError {
    pub fn status(&self) -> StatusCode {
        match self {
            MockError::NotFound(_) => StatusCode::NOT_FOUND,
            MockError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for MockError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        tracing::debug!(status = status.as_u16(), error = %message, "Rejecting request");

        // Same envelope shape as successful responses, so clients read `error`
        (status, Json(ApiResponse::<()>::failure(message))).into_response()
    }
}
