//! Upload driver: streams one local file to a receiver as a raw
//! `application/octet-stream` POST body while rendering live progress.
//!
//! # Pipeline
//!
//! 1. **Check** the source is a readable regular file and size it
//! 2. **Address** the request by setting `fileName` on the destination URL
//! 3. **Stream** the file through a byte counter into the request body
//! 4. **Tick** the rate estimator and status line until the response settles
//! 5. **Finalize** with a 100% render on success, or stop and report on failure

pub mod config;
pub mod destination;
pub mod driver;
pub mod error;
pub mod types;

// Re-export primary types for convenience.
pub use config::{CONFIG_FILE_NAME, ConfigError, DestinationConfig};
pub use destination::build_upload_url;
pub use driver::Uploader;
pub use error::{EXIT_INTERRUPTED, EXIT_USAGE, UploadError};
pub use types::{UploadOptions, UploadReport};

/// Read buffer size for the source file (256 KiB).
pub const READ_CHUNK_SIZE: usize = 256 * 1024;
