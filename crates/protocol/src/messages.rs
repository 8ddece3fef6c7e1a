use serde::{Deserialize, Serialize};

/// Body of a successful `POST /upload` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub ok: bool,
    /// Sanitized name the file was stored under.
    pub file_name: String,
    /// Bytes consumed from the request body.
    pub bytes_written: u64,
    /// Path of the stored file on the receiver.
    pub saved_to: String,
}

/// Body of a rejected or failed request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub ok: bool,
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: error.into(),
        }
    }
}
