use modelref_types::RecordError;
use thiserror::Error;

/// Errors that can be returned by [`crate::ReferenceClient`] operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be sent or the connection failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("reference service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not match the expected shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The configured base URL cannot carry path segments.
    #[error("invalid base URL: {0}")]
    InvalidUrl(String),

    /// A write was attempted without an API key.
    #[error("an API key is required for write operations")]
    MissingApiKey,

    /// A record was rejected before being submitted.
    #[error(transparent)]
    Record(#[from] RecordError),
}

impl ClientError {
    /// HTTP status of the upstream response, if the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
