//! Upload error types.

use std::error::Error as _;
use std::path::PathBuf;

use crate::config::ConfigError;

/// Exit status for a malformed command line.
pub const EXIT_USAGE: u8 = 2;

/// Exit status when the upload is cancelled by SIGINT (128 + 2).
pub const EXIT_INTERRUPTED: u8 = 130;

/// Errors produced while uploading. Every variant is fatal for the
/// invocation; nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("cannot access {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not a regular file: {}", path.display())]
    NotAFile { path: PathBuf },

    #[error("invalid destination URL {url:?}: {reason}")]
    InvalidDestination { url: String, reason: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("server rejected upload with status {status}: {body}")]
    RemoteRejection { status: u16, body: String },
}

impl UploadError {
    /// Process exit status for this error class.
    pub fn exit_code(&self) -> u8 {
        match self {
            UploadError::Configuration(_) => 3,
            UploadError::FileAccess { .. } | UploadError::NotAFile { .. } => 4,
            UploadError::InvalidDestination { .. } => 5,
            UploadError::Transport(_) => 6,
            UploadError::RemoteRejection { .. } => 7,
        }
    }

    /// Builds a [`UploadError::Transport`] carrying the full source chain,
    /// since reqwest's top-level message omits the underlying cause.
    pub(crate) fn transport(err: &reqwest::Error) -> Self {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        UploadError::Transport(message)
    }
}
