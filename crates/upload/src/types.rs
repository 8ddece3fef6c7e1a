use std::time::Duration;

use pipedrop_protocol::UploadReceipt;
use pipedrop_transfer::{DEFAULT_TICK_INTERVAL, format_mib, format_speed};
use url::Url;

/// Tuning knobs for an [`Uploader`](crate::Uploader).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    /// Progress redraw period.
    pub tick_interval: Duration,
    /// Overall HTTP timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            timeout: None,
        }
    }
}

/// Outcome of a successful upload.
#[derive(Debug, Clone)]
pub struct UploadReport {
    pub file_name: String,
    pub total_bytes: u64,
    pub elapsed: Duration,
    /// Final request URL.
    pub url: Url,
    /// Receiver acknowledgement, when the response body was a receipt.
    pub receipt: Option<UploadReceipt>,
}

impl UploadReport {
    /// Average throughput over the whole transfer, in bytes/sec.
    pub fn average_rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.total_bytes as f64 / secs
        } else {
            0.0
        }
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        format!(
            "Uploaded {} ({} MiB) in {:.2}s, {}",
            self.file_name,
            format_mib(self.total_bytes),
            self.elapsed.as_secs_f64(),
            format_speed(self.average_rate())
        )
    }
}
