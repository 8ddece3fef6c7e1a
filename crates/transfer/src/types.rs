use std::time::{Duration, Instant};

use url::Url;

use crate::counter::ByteCounter;

/// State of one upload for the lifetime of a single invocation.
///
/// `total_bytes` is fixed at creation; the uploaded counter is only ever
/// advanced by the [`CountingStream`](crate::CountingStream) wrapping the
/// body (and by [`mark_complete`](Self::mark_complete) once the receiver
/// has acknowledged everything).
#[derive(Debug, Clone)]
pub struct TransferSession {
    file_name: String,
    destination: Url,
    total_bytes: u64,
    uploaded: ByteCounter,
    started_at: Instant,
}

impl TransferSession {
    /// Creates a session starting now.
    pub fn new(file_name: String, destination: Url, total_bytes: u64) -> Self {
        Self {
            file_name,
            destination,
            total_bytes,
            uploaded: ByteCounter::new(),
            started_at: Instant::now(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Final request URL, including the `fileName` parameter.
    pub fn destination(&self) -> &Url {
        &self.destination
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Bytes that have passed through the body stream so far.
    pub fn uploaded_bytes(&self) -> u64 {
        self.uploaded.get()
    }

    /// Handle to the counter the body stream increments.
    pub fn counter(&self) -> ByteCounter {
        self.uploaded.clone()
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Forces the counter to the total after a successful response.
    pub fn mark_complete(&self) {
        self.uploaded.advance_to(self.total_bytes);
    }
}
