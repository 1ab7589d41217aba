//! Error types for the HTTP transport layer.

/// Errors that can occur while encoding or decoding payment headers.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The header is present but empty.
    #[error("{0} header is empty")]
    EmptyHeader(&'static str),
}
