/// Route the receiver accepts uploads on.
pub const UPLOAD_PATH: &str = "/upload";

/// Query parameter carrying the destination file name.
pub const FILE_NAME_PARAM: &str = "fileName";

/// Content type of every upload body (raw bytes, no framing).
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Port the receiver listens on when none is configured.
pub const DEFAULT_PORT: u16 = 3000;

/// Directory, relative to the receiver's working directory, that uploads land in.
pub const OUTPUT_DIR: &str = "output";
