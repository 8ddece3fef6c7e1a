use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pipedrop_protocol::ErrorBody;

/// Per-request failures, each mapped to an HTTP status.
#[derive(Debug, thiserror::Error)]
pub enum ReceiveError {
    #[error("Missing fileName query parameter")]
    MissingFileName,

    #[error("fileName query parameter must not be empty")]
    EmptyFileName,

    #[error("fileName query parameter must be a single string")]
    AmbiguousFileName,

    #[error("invalid fileName: {0}")]
    InvalidFileName(String),

    #[error("failed to read upload stream: {0}")]
    Stream(String),

    #[error("failed to write file: {0}")]
    Write(#[from] std::io::Error),
}

impl ReceiveError {
    pub fn status(&self) -> StatusCode {
        match self {
            ReceiveError::MissingFileName
            | ReceiveError::EmptyFileName
            | ReceiveError::AmbiguousFileName
            | ReceiveError::InvalidFileName(_) => StatusCode::BAD_REQUEST,
            ReceiveError::Stream(_) | ReceiveError::Write(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ReceiveError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorBody::new(self.to_string()))).into_response()
    }
}
