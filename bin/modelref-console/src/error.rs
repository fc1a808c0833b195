//! Unified console error type.
//!
//! Every handler returns `Result<T, ConsoleError>`, which implements
//! [`axum::response::IntoResponse`] so errors become a JSON body
//! `{"error": "..."}` with a matching status code.
//!
//! Upstream failures are logged with full detail; callers only see the
//! upstream status and a short message.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use modelref_client::ClientError;
use modelref_types::{FieldError, RecordError, UnknownCategory};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error(transparent)]
    UnknownCategory(#[from] UnknownCategory),

    /// The submitted record failed validation.
    #[error("invalid record")]
    InvalidRecord(Vec<FieldError>),

    #[error("bad request: {0}")]
    BadRequest(String),

    /// No API key in the request and none configured.
    #[error("an API key is required for this operation")]
    Unauthorized,

    /// A refresh for the same view is still in flight.
    #[error("a refresh for this view is already running")]
    AlreadyRunning,

    /// The reference service failed or answered with an error.
    #[error("reference service error: {0}")]
    Upstream(ClientError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RecordError> for ConsoleError {
    fn from(e: RecordError) -> Self {
        match e {
            RecordError::Invalid(fields) => ConsoleError::InvalidRecord(fields),
            other => ConsoleError::BadRequest(other.to_string()),
        }
    }
}

impl From<ClientError> for ConsoleError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Record(record) => record.into(),
            ClientError::MissingApiKey => ConsoleError::Unauthorized,
            other => ConsoleError::Upstream(other),
        }
    }
}

impl From<anyhow::Error> for ConsoleError {
    fn from(e: anyhow::Error) -> Self {
        error!(error = ?e, "converting anyhow error to ConsoleError::Internal");
        ConsoleError::Internal(e.to_string())
    }
}

/// Status sent to the console's caller for an upstream failure. Client-side
/// statuses from the reference service are passed through; everything else is
/// a bad gateway.
fn upstream_status(e: &ClientError) -> StatusCode {
    e.status()
        .and_then(|s| StatusCode::from_u16(s).ok())
        .filter(StatusCode::is_client_error)
        .unwrap_or(StatusCode::BAD_GATEWAY)
}

impl IntoResponse for ConsoleError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ConsoleError::UnknownCategory(e) => {
                (StatusCode::NOT_FOUND, json!({ "error": e.to_string() }))
            }
            ConsoleError::InvalidRecord(fields) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": self.to_string(), "fields": fields }),
            ),
            ConsoleError::BadRequest(m) => (StatusCode::BAD_REQUEST, json!({ "error": m })),
            ConsoleError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, json!({ "error": self.to_string() }))
            }
            ConsoleError::AlreadyRunning => {
                (StatusCode::CONFLICT, json!({ "error": self.to_string() }))
            }
            ConsoleError::Upstream(e) => {
                let status = upstream_status(e);
                if status == StatusCode::BAD_GATEWAY {
                    error!(error = %e, "reference service request failed");
                } else {
                    warn!(error = %e, "reference service rejected request");
                }
                let message = match e {
                    ClientError::Status { body, .. } if status != StatusCode::BAD_GATEWAY => {
                        body.clone()
                    }
                    _ => "reference service unavailable".to_owned(),
                };
                (status, json!({ "error": message }))
            }
            ConsoleError::Internal(m) => {
                error!(message = %m, "internal console error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "internal server error" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
