//! HTTP receiver for pipedrop uploads.
//!
//! Serves `POST /upload?fileName=<name>`, streaming the raw request body
//! into `<output_dir>/<sanitized name>`, and a plain-text `GET /`
//! liveness message.

mod error;
mod handler;
mod server;

pub use error::ReceiveError;
pub use handler::{INDEX_TEXT, requested_file_name, router, store_body};
pub use server::{ReceiverServer, ServerConfig};

/// Errors produced by the receiver server itself (not by a request).
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
