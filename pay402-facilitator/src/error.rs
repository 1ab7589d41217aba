//! Error types for the facilitator service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors that can occur while serving a facilitator request.
#[derive(Debug, thiserror::Error)]
pub enum FacilitatorError {
    /// The request body is not valid JSON for the endpoint.
    #[error("Invalid request body")]
    InvalidBody(#[source] serde_json::Error),

    /// The facilitator failed to produce an answer.
    #[error("{0}")]
    Facilitator(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl FacilitatorError {
    /// Wraps an error returned by the facilitator.
    pub fn facilitator<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Facilitator(Box::new(err))
    }
}

impl IntoResponse for FacilitatorError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidBody(_) => (StatusCode::BAD_REQUEST, self.to_string()).into_response(),
            Self::Facilitator(_) => {
                let body = serde_json::json!({ "error": self.to_string() });
                (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response()
            }
        }
    }
}
