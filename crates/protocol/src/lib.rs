pub mod constants;
pub mod messages;

// Re-export primary types for convenience.
pub use constants::{DEFAULT_PORT, FILE_NAME_PARAM, OCTET_STREAM, OUTPUT_DIR, UPLOAD_PATH};
pub use messages::{ErrorBody, UploadReceipt};
